use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Build an event from an already encoded data field.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever the current quarter changes or a quarter starts.
pub struct QuarterChangedEvent {
    pub quarter: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
/// Why the arena buzzer should sound.
pub enum BuzzerReason {
    QuarterStart,
    QuarterEnd,
}

#[derive(Debug, Serialize, ToSchema)]
/// Signal for scoreboards to play the buzzer.
pub struct BuzzerEvent {
    pub reason: BuzzerReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
/// Side that won a finished match.
pub enum Winner {
    Home,
    Away,
    Draw,
}

impl Winner {
    /// Compare final scores.
    pub fn from_scores(home: u32, away: u32) -> Self {
        match home.cmp(&away) {
            std::cmp::Ordering::Greater => Winner::Home,
            std::cmp::Ordering::Less => Winner::Away,
            std::cmp::Ordering::Equal => Winner::Draw,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once a match is finished.
pub struct MatchEndedEvent {
    pub home: u32,
    pub away: u32,
    pub winner: Winner,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn buzzer_reason_uses_kebab_case() {
        let event = ServerEvent::json(
            Some("buzzer".to_string()),
            &BuzzerEvent {
                reason: BuzzerReason::QuarterEnd,
            },
        )
        .unwrap();
        assert_eq!(event.data, r#"{"reason":"quarter-end"}"#);
    }

    #[test]
    fn match_ended_reports_the_winner() {
        let payload = MatchEndedEvent {
            home: 70,
            away: 72,
            winner: Winner::from_scores(70, 72),
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({ "home": 70, "away": 72, "winner": "away" })
        );
        assert_eq!(Winner::from_scores(5, 5), Winner::Draw);
    }
}
