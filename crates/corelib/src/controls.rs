//! Keyboard-driven model transform state. The windowing layer maps raw key
//! codes to [`TransformCommand`]s and applies them once per frame while
//! held; this module knows nothing about the windowing API.

use crate::{Mat4, Vec3};
use crate::transform::Transform;

/// One held-key command. Forward is -Z, matching the camera looking down
/// the negative Z axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformCommand {
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    ScaleDown,
    ScaleUp,
    SpinX,
    SpinY,
    SpinZ,
}

/// Explicit per-demo transform state; replaces ad-hoc globals.
#[derive(Clone, Copy, Debug)]
pub struct ModelController {
    pub transform: Transform,
    /// Units per frame while a move key is held.
    pub move_speed: f32,
    /// Scale delta per frame while a bracket key is held.
    pub scale_speed: f32,
    /// Degrees per frame while a spin key is held.
    pub spin_speed_deg: f32,
}

impl ModelController {
    pub fn new() -> Self {
        Self {
            transform: Transform::identity(),
            move_speed: 0.05,
            scale_speed: 0.02,
            spin_speed_deg: 1.0,
        }
    }

    pub fn apply(&mut self, command: TransformCommand) {
        let t = &mut self.transform;
        match command {
            TransformCommand::MoveForward => t.translation.z -= self.move_speed,
            TransformCommand::MoveBack => t.translation.z += self.move_speed,
            TransformCommand::MoveLeft => t.translation.x -= self.move_speed,
            TransformCommand::MoveRight => t.translation.x += self.move_speed,
            TransformCommand::MoveUp => t.translation.y += self.move_speed,
            TransformCommand::MoveDown => t.translation.y -= self.move_speed,
            TransformCommand::ScaleDown => t.scale -= Vec3::splat(self.scale_speed),
            TransformCommand::ScaleUp => t.scale += Vec3::splat(self.scale_speed),
            TransformCommand::SpinX => t.rotation_deg.x += self.spin_speed_deg,
            TransformCommand::SpinY => t.rotation_deg.y += self.spin_speed_deg,
            TransformCommand::SpinZ => t.rotation_deg.z += self.spin_speed_deg,
        }
    }

    #[inline]
    pub fn matrix(&self) -> Mat4 {
        self.transform.matrix()
    }
}

impl Default for ModelController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_commands_translate() {
        let mut controller = ModelController::new();
        controller.apply(TransformCommand::MoveForward);
        controller.apply(TransformCommand::MoveForward);
        controller.apply(TransformCommand::MoveRight);
        let t = controller.transform.translation;
        assert!((t.z + 0.1).abs() < 1e-6);
        assert!((t.x - 0.05).abs() < 1e-6);
        assert_eq!(t.y, 0.0);
    }

    #[test]
    fn scale_commands_stay_uniform() {
        let mut controller = ModelController::new();
        controller.apply(TransformCommand::ScaleUp);
        controller.apply(TransformCommand::ScaleUp);
        let s = controller.transform.scale;
        assert!((s.x - 1.04).abs() < 1e-6);
        assert_eq!(s.x, s.y);
        assert_eq!(s.y, s.z);
    }

    #[test]
    fn spin_accumulates_degrees() {
        let mut controller = ModelController::new();
        for _ in 0..90 {
            controller.apply(TransformCommand::SpinY);
        }
        assert!((controller.transform.rotation_deg.y - 90.0).abs() < 1e-6);
        // 90 degrees about Y sends +X to -Z.
        let m = controller.matrix();
        let rotated = m.transform_vector3(crate::vec3(1.0, 0.0, 0.0));
        assert!(rotated.x.abs() < 1e-5);
        assert!((rotated.z + 1.0).abs() < 1e-5);
    }
}
