//! Session-scoped search state
//!
//! A session keeps the user's preferences, the criteria of the last
//! successful search and the color map. Sessions belong to one principal
//! and are not shared between concurrent requests.

use serde::{Deserialize, Serialize};

use super::color::AccountColorMap;
use super::criteria::{SearchCriteria, SessionKind, UserPreferences};

/// Storage for per-session search state
pub trait SessionStore: Send {
    fn session_kind(&self) -> SessionKind;

    fn preferences(&self) -> UserPreferences;

    /// Remember the criteria for a later repeat
    fn persist_last_criteria(&mut self, criteria: &SearchCriteria);

    fn last_criteria(&self) -> Option<&SearchCriteria>;

    fn color_map(&self) -> &AccountColorMap;

    fn color_map_mut(&mut self) -> &mut AccountColorMap;
}

/// In-memory session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchSession {
    pub kind: SessionKind,
    pub preferences: UserPreferences,
    pub last_criteria: Option<SearchCriteria>,
    pub colors: AccountColorMap,
}

impl SearchSession {
    /// Interactive session with the given preferences
    pub fn interactive(preferences: UserPreferences) -> Self {
        Self {
            kind: SessionKind::Interactive,
            preferences,
            ..Default::default()
        }
    }

    /// API session, preferences do not apply
    pub fn api() -> Self {
        Self {
            kind: SessionKind::Api,
            ..Default::default()
        }
    }
}

impl SessionStore for SearchSession {
    fn session_kind(&self) -> SessionKind {
        self.kind
    }

    fn preferences(&self) -> UserPreferences {
        self.preferences
    }

    fn persist_last_criteria(&mut self, criteria: &SearchCriteria) {
        self.last_criteria = Some(criteria.clone());
    }

    fn last_criteria(&self) -> Option<&SearchCriteria> {
        self.last_criteria.as_ref()
    }

    fn color_map(&self) -> &AccountColorMap {
        &self.colors
    }

    fn color_map_mut(&mut self) -> &mut AccountColorMap {
        &mut self.colors
    }
}
