use glam::Vec3;

use vanguard::InputCommand;

/// One frame of intent before it is packed for the wire. At most one action
/// is sent per frame; heal wins over melee, melee over ranged.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub move_direction: Vec3,
    pub aim: Vec3,
    pub melee: bool,
    pub ranged: bool,
    pub heal_target: Option<i32>,
}

impl InputState {
    pub fn to_command(&self) -> InputCommand {
        let (action, target_slot) = match (self.heal_target, self.melee, self.ranged) {
            (Some(slot), _, _) => (InputCommand::ACTION_HEAL, slot),
            (None, true, _) => (InputCommand::ACTION_MELEE, -1),
            (None, false, true) => (InputCommand::ACTION_RANGED, -1),
            (None, false, false) => (InputCommand::ACTION_NONE, -1),
        };

        InputCommand {
            move_x: self.move_direction.x,
            move_z: self.move_direction.z,
            look_x: self.aim.x,
            look_z: self.aim.z,
            action,
            target_slot,
        }
    }
}
