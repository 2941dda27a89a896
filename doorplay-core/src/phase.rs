use serde::{Deserialize, Serialize};

/// Number of sessions in a run: one practice session followed by main blocks.
pub const SESSION_COUNT: u8 = 4;

/// Defines session phases and behavior
pub trait Phase: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug + Default {
    /// Whether door movement input is accepted.
    fn allows_movement(&self) -> bool;
    fn next(&self) -> Option<Self>;

    /// Session number the phase belongs to, if any.
    fn session(&self) -> Option<u8> {
        None
    }

    fn is_instructions(&self) -> bool {
        false
    }
    fn is_block(&self) -> bool {
        false
    }
    fn is_practice(&self) -> bool {
        false
    }
    fn is_simulation_end(&self) -> bool {
        false
    }
    fn is_wheel(&self) -> bool {
        false
    }
    fn is_summary(&self) -> bool {
        false
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoorPhase {
    Instructions { session: u8 },
    Block { session: u8 },
    SimulationEnd,
    Wheel,
    Summary,
}

impl Default for DoorPhase {
    fn default() -> Self {
        DoorPhase::Instructions { session: 0 }
    }
}

impl Phase for DoorPhase {
    fn allows_movement(&self) -> bool {
        matches!(self, Self::Block { .. })
    }

    fn next(&self) -> Option<Self> {
        use DoorPhase::*;
        Some(match *self {
            Instructions { session } => Block { session },
            Block { session } if session + 1 < SESSION_COUNT => Instructions {
                session: session + 1,
            },
            Block { .. } => SimulationEnd,
            SimulationEnd => Wheel,
            Wheel => Summary,
            Summary => return None,
        })
    }

    fn session(&self) -> Option<u8> {
        match self {
            Self::Instructions { session } | Self::Block { session } => Some(*session),
            _ => None,
        }
    }

    fn is_instructions(&self) -> bool {
        matches!(self, Self::Instructions { .. })
    }

    fn is_block(&self) -> bool {
        matches!(self, Self::Block { .. })
    }

    fn is_practice(&self) -> bool {
        matches!(self, Self::Block { session: 0 })
    }

    fn is_simulation_end(&self) -> bool {
        matches!(self, Self::SimulationEnd)
    }

    fn is_wheel(&self) -> bool {
        matches!(self, Self::Wheel)
    }

    fn is_summary(&self) -> bool {
        matches!(self, Self::Summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_every_session_then_closing_screens() {
        let mut phase = DoorPhase::default();
        let mut seen = vec![phase];
        while let Some(next) = phase.next() {
            seen.push(next);
            phase = next;
        }

        assert_eq!(seen.len(), 2 * SESSION_COUNT as usize + 3);
        assert_eq!(seen[1], DoorPhase::Block { session: 0 });
        assert_eq!(seen[seen.len() - 3], DoorPhase::SimulationEnd);
        assert!(seen.last().is_some_and(|p| p.is_summary()));
    }

    #[test]
    fn only_blocks_take_movement() {
        assert!(DoorPhase::Block { session: 2 }.allows_movement());
        assert!(!DoorPhase::Instructions { session: 2 }.allows_movement());
        assert!(!DoorPhase::Wheel.allows_movement());
        assert!(DoorPhase::Block { session: 0 }.is_practice());
        assert!(!DoorPhase::Block { session: 1 }.is_practice());
    }
}
