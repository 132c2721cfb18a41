//! Handshake stage machine

use crate::{Error, Result};

/// Negotiation stage
///
/// Stages advance strictly forward; a session never revisits a stage. Any
/// unexpected byte or stream error moves the session to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationStage {
    /// Method offer sent, awaiting the proxy's method selection
    MethodNegotiation,

    /// Credential presented, awaiting the authentication verdict
    Authentication,

    /// Connect request sent, awaiting the tunnel verdict
    Connecting,

    /// Tunnel established (terminal)
    Established,

    /// Negotiation failed (terminal)
    Failed,
}

impl NegotiationStage {
    /// Check if transition is valid
    pub fn can_transition_to(&self, next: NegotiationStage) -> bool {
        use NegotiationStage::*;

        matches!(
            (self, next),
            (MethodNegotiation, Authentication)
                | (Authentication, Connecting)
                | (Connecting, Established)
                | (MethodNegotiation, Failed)
                | (Authentication, Failed)
                | (Connecting, Failed)
        )
    }

    /// Transition to the next stage
    pub fn transition(&mut self, next: NegotiationStage) -> Result<()> {
        if !self.can_transition_to(next) {
            return Err(Error::InvalidState {
                expected: format!("valid transition from {:?}", self),
                actual: format!("{:?}", next),
            });
        }
        *self = next;
        Ok(())
    }

    /// Whether the stage is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, NegotiationStage::Established | NegotiationStage::Failed)
    }
}

impl std::fmt::Display for NegotiationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MethodNegotiation => write!(f, "method_negotiation"),
            Self::Authentication => write!(f, "authentication"),
            Self::Connecting => write!(f, "connecting"),
            Self::Established => write!(f, "established"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        let mut stage = NegotiationStage::MethodNegotiation;
        assert!(stage.transition(NegotiationStage::Authentication).is_ok());
        assert!(stage.transition(NegotiationStage::Connecting).is_ok());
        assert!(stage.transition(NegotiationStage::Established).is_ok());
        assert!(stage.is_terminal());
    }

    #[test]
    fn test_no_stage_skipping() {
        let mut stage = NegotiationStage::MethodNegotiation;
        assert!(stage.transition(NegotiationStage::Connecting).is_err());
        assert!(stage.transition(NegotiationStage::Established).is_err());
    }

    #[test]
    fn test_fail_from_any_active_stage() {
        for start in [
            NegotiationStage::MethodNegotiation,
            NegotiationStage::Authentication,
            NegotiationStage::Connecting,
        ] {
            let mut stage = start;
            assert!(stage.transition(NegotiationStage::Failed).is_ok());
        }
    }

    #[test]
    fn test_terminal_stages_do_not_advance() {
        let mut stage = NegotiationStage::Established;
        assert!(stage.transition(NegotiationStage::Failed).is_err());

        let mut stage = NegotiationStage::Failed;
        assert!(stage.transition(NegotiationStage::MethodNegotiation).is_err());
        assert!(stage.transition(NegotiationStage::Established).is_err());
    }

    #[test]
    fn test_no_stage_revisited() {
        let mut stage = NegotiationStage::Authentication;
        assert!(stage
            .transition(NegotiationStage::MethodNegotiation)
            .is_err());

        let mut stage = NegotiationStage::Connecting;
        assert!(stage.transition(NegotiationStage::Authentication).is_err());
    }
}
