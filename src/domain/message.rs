/// Onboarding phase a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Di,
    To2,
    Other,
}

/// Which side of the exchange a message was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Request,
    Response,
}

/// FDO message types the proxy understands. Everything else is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    DiAppStart,
    DiSetCredentials,
    DiSetHmac,
    DiDone,
    To2HelloDevice,
    To2ProveOvHdr,
    To2GetOvNextEntry,
    To2OvNextEntry,
    To2ProveDevice,
    To2SetupDevice,
    To2DeviceServiceInfoReady,
    To2OwnerServiceInfoReady,
    To2DeviceServiceInfo,
    To2OwnerServiceInfo,
    To2Done,
    To2Done2,
    Unknown,
}

impl MessageType {
    pub fn from_code(code: u16) -> Self {
        match code {
            10 => MessageType::DiAppStart,
            11 => MessageType::DiSetCredentials,
            12 => MessageType::DiSetHmac,
            13 => MessageType::DiDone,
            60 => MessageType::To2HelloDevice,
            61 => MessageType::To2ProveOvHdr,
            62 => MessageType::To2GetOvNextEntry,
            63 => MessageType::To2OvNextEntry,
            64 => MessageType::To2ProveDevice,
            65 => MessageType::To2SetupDevice,
            66 => MessageType::To2DeviceServiceInfoReady,
            67 => MessageType::To2OwnerServiceInfoReady,
            68 => MessageType::To2DeviceServiceInfo,
            69 => MessageType::To2OwnerServiceInfo,
            70 => MessageType::To2Done,
            71 => MessageType::To2Done2,
            _ => MessageType::Unknown,
        }
    }

    pub fn code(&self) -> Option<u16> {
        let code = match self {
            MessageType::DiAppStart => 10,
            MessageType::DiSetCredentials => 11,
            MessageType::DiSetHmac => 12,
            MessageType::DiDone => 13,
            MessageType::To2HelloDevice => 60,
            MessageType::To2ProveOvHdr => 61,
            MessageType::To2GetOvNextEntry => 62,
            MessageType::To2OvNextEntry => 63,
            MessageType::To2ProveDevice => 64,
            MessageType::To2SetupDevice => 65,
            MessageType::To2DeviceServiceInfoReady => 66,
            MessageType::To2OwnerServiceInfoReady => 67,
            MessageType::To2DeviceServiceInfo => 68,
            MessageType::To2OwnerServiceInfo => 69,
            MessageType::To2Done => 70,
            MessageType::To2Done2 => 71,
            MessageType::Unknown => return None,
        };
        Some(code)
    }

    pub fn phase(&self) -> Phase {
        match self.code() {
            Some(10..=13) => Phase::Di,
            Some(60..=71) => Phase::To2,
            _ => Phase::Other,
        }
    }

    /// Device-sent messages travel as requests; the server answers with odd codes.
    pub fn direction(&self) -> Option<Direction> {
        self.code().map(|code| {
            if code % 2 == 0 {
                Direction::Request
            } else {
                Direction::Response
            }
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            MessageType::DiAppStart => "DI.AppStart",
            MessageType::DiSetCredentials => "DI.SetCredentials",
            MessageType::DiSetHmac => "DI.SetHMAC",
            MessageType::DiDone => "DI.Done",
            MessageType::To2HelloDevice => "TO2.HelloDevice",
            MessageType::To2ProveOvHdr => "TO2.ProveOVHdr",
            MessageType::To2GetOvNextEntry => "TO2.GetOVNextEntry",
            MessageType::To2OvNextEntry => "TO2.OVNextEntry",
            MessageType::To2ProveDevice => "TO2.ProveDevice",
            MessageType::To2SetupDevice => "TO2.SetupDevice",
            MessageType::To2DeviceServiceInfoReady => "TO2.DeviceServiceInfoReady",
            MessageType::To2OwnerServiceInfoReady => "TO2.OwnerServiceInfoReady",
            MessageType::To2DeviceServiceInfo => "TO2.DeviceServiceInfo",
            MessageType::To2OwnerServiceInfo => "TO2.OwnerServiceInfo",
            MessageType::To2Done => "TO2.Done",
            MessageType::To2Done2 => "TO2.Done2",
            MessageType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Classification result for one observed request or response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageTag {
    pub phase: Phase,
    pub message_type: MessageType,
    pub direction: Direction,
}

impl MessageTag {
    pub fn other(direction: Direction) -> Self {
        Self {
            phase: Phase::Other,
            message_type: MessageType::Unknown,
            direction,
        }
    }

    /// A type seen travelling the wrong way is not part of its phase.
    pub fn observed(message_type: MessageType, direction: Direction) -> Self {
        if message_type.direction() != Some(direction) {
            return Self::other(direction);
        }
        Self {
            phase: message_type.phase(),
            message_type,
            direction,
        }
    }

    pub fn is_di_request(&self) -> bool {
        self.phase == Phase::Di && self.direction == Direction::Request
    }

    pub fn is_di_response(&self) -> bool {
        self.phase == Phase::Di && self.direction == Direction::Response
    }

    pub fn is_to2_request(&self) -> bool {
        self.phase == Phase::To2 && self.direction == Direction::Request
    }

    pub fn is_to2_done2(&self) -> bool {
        self.message_type == MessageType::To2Done2 && self.direction == Direction::Response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_through_vocabulary() {
        for code in (10..=13).chain(60..=71) {
            let message_type = MessageType::from_code(code);
            assert_ne!(message_type, MessageType::Unknown, "code {}", code);
            assert_eq!(message_type.code(), Some(code));
        }
        assert_eq!(MessageType::from_code(20), MessageType::Unknown);
        assert_eq!(MessageType::from_code(80), MessageType::Unknown);
    }

    #[test]
    fn test_opposite_direction_is_other() {
        let tag = MessageTag::observed(MessageType::DiSetCredentials, Direction::Request);
        assert_eq!(tag.phase, Phase::Other);
        assert_eq!(tag.message_type, MessageType::Unknown);

        let tag = MessageTag::observed(MessageType::To2Done2, Direction::Response);
        assert!(tag.is_to2_done2());
    }
}
