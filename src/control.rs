//! UI-facing control flags and the observer seam.
//!
//! The control panel is a projection for whatever front end drives the
//! engine: it says which affordances to show. It is never stored, only
//! rebuilt from resolved events.

use std::sync::mpsc::Sender;

use serde::Serialize;

use crate::board::state::Game;
use crate::resolve::GameEvent;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPanel {
    /// A command or event cascade is in progress.
    pub updating: bool,
    pub my_turn: bool,
    pub i_need_to_choose_my_boat: bool,
    pub i_need_to_choose_the_course: bool,
    pub i_need_to_choose_wind_origin_dir: bool,
    pub my_turn_to_choose_starting_pos: bool,
    pub i_am_not_allowed_to_move_this_turn: bool,
}

/// A partial update. `None` leaves a flag unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updating: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_turn: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i_need_to_choose_my_boat: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i_need_to_choose_the_course: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i_need_to_choose_wind_origin_dir: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_turn_to_choose_starting_pos: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i_am_not_allowed_to_move_this_turn: Option<bool>,
}

impl ControlPatch {
    pub fn updating(on: bool) -> Self {
        ControlPatch {
            updating: Some(on),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ControlPatch::default()
    }
}

impl ControlPanel {
    pub fn apply(&mut self, patch: &ControlPatch) {
        let fields = [
            (&mut self.updating, patch.updating),
            (&mut self.my_turn, patch.my_turn),
            (&mut self.i_need_to_choose_my_boat, patch.i_need_to_choose_my_boat),
            (&mut self.i_need_to_choose_the_course, patch.i_need_to_choose_the_course),
            (
                &mut self.i_need_to_choose_wind_origin_dir,
                patch.i_need_to_choose_wind_origin_dir,
            ),
            (
                &mut self.my_turn_to_choose_starting_pos,
                patch.my_turn_to_choose_starting_pos,
            ),
            (
                &mut self.i_am_not_allowed_to_move_this_turn,
                patch.i_am_not_allowed_to_move_this_turn,
            ),
        ];
        for (flag, value) in fields {
            if let Some(v) = value {
                *flag = v;
            }
        }
    }
}

/// Receives everything the engine wants a front end to know about.
pub trait GameObserver {
    /// A new game snapshot was adopted or written.
    fn on_game_change(&mut self, _game: &Game) {}

    /// An event is about to be resolved.
    fn on_game_event(&mut self, _event: GameEvent) {}

    /// Control flags changed.
    fn on_controls(&mut self, _patch: &ControlPatch) {}
}

/// Ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl GameObserver for NoopObserver {}

/// A notification forwarded by `ChannelObserver`.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    GameChanged,
    Event(GameEvent),
    Controls(ControlPatch),
}

/// Forwards notifications over a channel. Send errors mean the receiver
/// is gone and are ignored.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: Sender<Notice>,
}

impl ChannelObserver {
    pub fn new(tx: Sender<Notice>) -> Self {
        ChannelObserver { tx }
    }
}

impl GameObserver for ChannelObserver {
    fn on_game_change(&mut self, _game: &Game) {
        let _ = self.tx.send(Notice::GameChanged);
    }

    fn on_game_event(&mut self, event: GameEvent) {
        let _ = self.tx.send(Notice::Event(event));
    }

    fn on_controls(&mut self, patch: &ControlPatch) {
        let _ = self.tx.send(Notice::Controls(*patch));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn patch_touches_only_set_flags() {
        let mut panel = ControlPanel {
            my_turn: true,
            ..Default::default()
        };
        panel.apply(&ControlPatch {
            updating: Some(true),
            i_need_to_choose_my_boat: Some(true),
            ..Default::default()
        });
        assert!(panel.updating);
        assert!(panel.my_turn);
        assert!(panel.i_need_to_choose_my_boat);
        panel.apply(&ControlPatch {
            my_turn: Some(false),
            ..Default::default()
        });
        assert!(!panel.my_turn);
        assert!(panel.updating);
    }

    #[test]
    fn patch_serializes_sparse() {
        let v = serde_json::to_value(ControlPatch::updating(false)).unwrap();
        assert_eq!(v, serde_json::json!({ "updating": false }));
        assert!(ControlPatch::default().is_empty());
    }

    #[test]
    fn channel_observer_forwards() {
        let (tx, rx) = mpsc::channel();
        let mut obs = ChannelObserver::new(tx);
        obs.on_game_event(GameEvent::MyTurnNow);
        obs.on_controls(&ControlPatch::updating(true));
        let got: Vec<Notice> = rx.try_iter().collect();
        assert_eq!(
            got,
            vec![
                Notice::Event(GameEvent::MyTurnNow),
                Notice::Controls(ControlPatch::updating(true))
            ]
        );
    }
}
