//! Scope selection for the authorization redirect

use std::fmt;

/// Scopes requested when a broadcaster connects their channel
pub const BROADCASTER_SCOPES: [&str; 25] = [
    "channel_editor",
    "chat:read",
    "chat:edit",
    "channel:moderate",
    "channel:read:subscriptions",
    "channel:manage:vips",
    "user:edit:broadcast",
    "user:read:broadcast",
    "channel:edit:commercial",
    "channel:read:redemptions",
    "moderation:read",
    "channel:read:hype_train",
    "moderator:read:chatters",
    "channel:read:polls",
    "channel:read:predictions",
    "channel:manage:polls",
    "channel:manage:predictions",
    "channel:manage:moderators",
    "moderator:manage:banned_users",
    "moderator:read:followers",
    "bits:read",
    "channel:read:charity",
    "channel:read:goals",
    "moderator:read:shield_mode",
    "moderator:read:shoutouts",
];

/// Scopes requested when a bot account is connected
pub const BOT_SCOPES: [&str; 16] = [
    "clips:edit",
    "user:edit:broadcast",
    "user:read:broadcast",
    "chat:read",
    "chat:edit",
    "channel:moderate",
    "whispers:read",
    "whispers:edit",
    "channel:edit:commercial",
    "moderator:manage:announcements",
    "moderator:manage:chat_messages",
    "moderator:manage:banned_users",
    "moderator:read:chatters",
    "user:manage:whispers",
    "bits:read",
    "moderator:manage:chat_settings",
];

/// Which account type is being authorized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Channel owner
    Broadcaster,
    /// Bot account acting in the channel
    Bot,
}

impl AuthMode {
    /// Mode encoded in a decoded `state` value: a `bot` prefix selects [`AuthMode::Bot`]
    #[must_use]
    pub fn from_state(state: &str) -> Self {
        if state.starts_with("bot") {
            Self::Bot
        } else {
            Self::Broadcaster
        }
    }

    /// Ordered scope list for this mode
    #[must_use]
    pub fn scopes(self) -> &'static [&'static str] {
        match self {
            Self::Broadcaster => &BROADCASTER_SCOPES,
            Self::Bot => &BOT_SCOPES,
        }
    }

    /// Space-joined scope string as sent in the `scope` parameter
    #[must_use]
    pub fn scope_param(self) -> String {
        self.scopes().join(" ")
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broadcaster => write!(f, "broadcaster"),
            Self::Bot => write!(f, "bot"),
        }
    }
}

/// Authorization request derived from an inbound `state` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// Decoded state, echoed back to the provider unchanged
    pub state: String,
    /// Account type selected by the state prefix
    pub mode: AuthMode,
}

impl AuthorizationRequest {
    /// Build from an already decoded state value
    #[must_use]
    pub fn new(state: String) -> Self {
        let mode = AuthMode::from_state(&state);
        Self { state, mode }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn bot_prefix_selects_bot_mode() {
        assert_eq!(AuthMode::from_state("bot"), AuthMode::Bot);
        assert_eq!(AuthMode::from_state("bot123"), AuthMode::Bot);
        assert_eq!(AuthMode::from_state("botanist"), AuthMode::Bot);
    }

    #[test]
    fn anything_else_selects_broadcaster() {
        for state in ["foo", "Bot123", " bot", "robot", "b", "123bot"] {
            assert_eq!(
                AuthMode::from_state(state),
                AuthMode::Broadcaster,
                "state {state:?}"
            );
        }
    }

    #[test]
    fn scope_lists_have_documented_sizes_and_no_duplicates() {
        assert_eq!(AuthMode::Broadcaster.scopes().len(), 25);
        assert_eq!(AuthMode::Bot.scopes().len(), 16);

        let unique: HashSet<_> = BROADCASTER_SCOPES.iter().collect();
        assert_eq!(unique.len(), BROADCASTER_SCOPES.len());
        let unique: HashSet<_> = BOT_SCOPES.iter().collect();
        assert_eq!(unique.len(), BOT_SCOPES.len());
    }

    #[test]
    fn scope_param_is_space_joined_in_order() {
        let param = AuthMode::Bot.scope_param();
        assert!(param.starts_with("clips:edit user:edit:broadcast "));
        assert!(param.ends_with(" bits:read moderator:manage:chat_settings"));
        assert_eq!(param.split(' ').count(), 16);

        let param = AuthMode::Broadcaster.scope_param();
        assert!(param.starts_with("channel_editor chat:read chat:edit "));
        assert!(param.ends_with(" moderator:read:shoutouts"));
    }

    #[test]
    fn authorization_request_keeps_state() {
        let req = AuthorizationRequest::new("bot-42".to_string());
        assert_eq!(req.state, "bot-42");
        assert_eq!(req.mode, AuthMode::Bot);
        assert_eq!(req.mode.to_string(), "bot");
    }
}
