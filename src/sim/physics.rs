//! Player control and vertical motion
//!
//! Jumping and ducking are mutually exclusive: ground obstacles are jumped,
//! flying ones are ducked, and a request that would combine the two poses
//! is ignored.

use super::state::Player;
use crate::tuning::Tuning;

impl Player {
    /// Start a jump. No-op while airborne or ducking.
    pub fn jump(&mut self, tuning: &Tuning) {
        if !self.is_jumping && !self.is_ducking {
            self.vel_y = tuning.jump_impulse;
            self.is_jumping = true;
        }
    }

    /// Crouch. No-op while airborne.
    pub fn duck(&mut self, tuning: &Tuning) {
        if !self.is_jumping {
            self.is_ducking = true;
            self.size.y = tuning.duck_height;
            self.pos.y = tuning.ducking_y();
        }
    }

    /// Stand back up. No-op unless ducking.
    pub fn stop_duck(&mut self, tuning: &Tuning) {
        if self.is_ducking {
            self.is_ducking = false;
            self.size.y = tuning.player_height;
            self.pos.y = tuning.standing_y();
        }
    }

    /// Advance one tick of gravity. Grounded players are untouched.
    pub fn integrate(&mut self, tuning: &Tuning) {
        if !self.is_jumping {
            return;
        }

        self.vel_y += tuning.gravity;
        self.pos.y += self.vel_y;

        // Land
        if self.pos.y >= tuning.standing_y() {
            self.pos.y = tuning.standing_y();
            self.vel_y = 0.0;
            self.is_jumping = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jump_arc_lands_on_ground() {
        let tuning = Tuning::default();
        let mut player = Player::new(&tuning);

        player.jump(&tuning);
        assert!(player.is_jumping);
        assert_eq!(player.vel_y, tuning.jump_impulse);

        let mut peak = player.pos.y;
        let mut ticks = 0;
        while player.is_jumping {
            player.integrate(&tuning);
            peak = peak.min(player.pos.y);
            ticks += 1;
            assert!(ticks < 1000, "player never landed");
        }

        assert_eq!(player.pos.y, tuning.ground_y);
        assert_eq!(player.vel_y, 0.0);
        assert!(peak < tuning.ground_y - 100.0, "jump too low: peak {}", peak);
        // Airtime is ~2 * 12 / 0.6 ticks; float rounding decides the last one
        assert!((39..=40).contains(&ticks), "airtime {} ticks", ticks);
    }

    #[test]
    fn test_cannot_double_jump() {
        let tuning = Tuning::default();
        let mut player = Player::new(&tuning);
        player.jump(&tuning);
        player.integrate(&tuning);
        let vel = player.vel_y;
        player.jump(&tuning);
        assert_eq!(player.vel_y, vel);
    }

    #[test]
    fn test_duck_and_stand() {
        let tuning = Tuning::default();
        let mut player = Player::new(&tuning);

        player.duck(&tuning);
        assert!(player.is_ducking);
        assert_eq!(player.size.y, 20.0);
        assert_eq!(player.pos.y, 350.0);
        // Bottom edge stays on the ground
        assert_eq!(player.pos.y + player.size.y, 370.0);

        player.stop_duck(&tuning);
        assert!(!player.is_ducking);
        assert_eq!(player.size.y, 50.0);
        assert_eq!(player.pos.y, 320.0);
    }

    #[test]
    fn test_jump_ignored_while_ducking() {
        let tuning = Tuning::default();
        let mut player = Player::new(&tuning);
        player.duck(&tuning);
        player.jump(&tuning);
        assert!(!player.is_jumping);
        assert!(player.is_ducking);
    }

    #[test]
    fn test_duck_ignored_while_jumping() {
        let tuning = Tuning::default();
        let mut player = Player::new(&tuning);
        player.jump(&tuning);
        player.integrate(&tuning);
        let y = player.pos.y;
        player.duck(&tuning);
        assert!(!player.is_ducking);
        assert_eq!(player.pos.y, y);
        assert_eq!(player.size.y, tuning.player_height);
    }

    #[test]
    fn test_stop_duck_midair_keeps_position() {
        let tuning = Tuning::default();
        let mut player = Player::new(&tuning);
        player.jump(&tuning);
        player.integrate(&tuning);
        let y = player.pos.y;
        player.stop_duck(&tuning);
        assert_eq!(player.pos.y, y);
        assert!(player.is_jumping);
    }
}
