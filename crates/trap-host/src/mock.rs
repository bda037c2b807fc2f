// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory `HostPort` implementation for tests and the CLI harness.

use crate::error::HostError;
use crate::port::HostPort;
use crate::types::{ChatMessage, Character, Door, Graphic, Page, PathObj, Recipient, Window};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::collections::HashMap;
use trap_domain::{CharacterId, PageId, PlayerId, TokenId};
use trap_geom::Vec2;

/// One delivered message, recorded for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// A page-wide chat send.
    Chat {
        /// Target page.
        page_id: PageId,
        /// The message sent.
        message: ChatMessage,
    },
    /// A whisper to a single recipient.
    Whisper {
        /// Recipient of the whisper.
        to: Recipient,
        /// Whispered body text.
        body: String,
    },
}

/// One recorded scheduled-move request, for test assertions (the mock does
/// not run a real timer; callers that want the move applied call
/// [`MockHost::run_scheduled_moves`]).
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledMove {
    /// Token to move.
    pub token_id: TokenId,
    /// Target position.
    pub target: Vec2,
    /// Requested delay, in milliseconds.
    pub delay_ms: u64,
}

/// One recorded area-trigger dispatch, for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaTriggerCall {
    /// Tag passed to the collaborator.
    pub tag: String,
    /// Radius in feet.
    pub radius_ft: f64,
    /// Action macro string.
    pub action_macro: String,
    /// Per-token flag.
    pub is_per_token: bool,
    /// Origin point.
    pub origin: Vec2,
    /// Page the trigger runs on.
    pub page_id: PageId,
}

/// An in-memory host: a fixed object graph plus mutable logs of everything
/// the engine sent out, and a seeded RNG so dice rolls are reproducible.
pub struct MockHost {
    graphics: HashMap<TokenId, Graphic>,
    doors: HashMap<TokenId, Door>,
    windows: HashMap<TokenId, Window>,
    paths: HashMap<TokenId, PathObj>,
    pages: HashMap<PageId, Page>,
    characters: HashMap<CharacterId, Character>,
    sheet_items: HashMap<(CharacterId, String), f64>,
    macros: HashMap<String, String>,
    rng: RefCell<StdRng>,

    /// Everything sent via `send_chat`/`whisper`, in order.
    pub deliveries: Vec<Delivery>,
    /// Every `schedule_delayed_move` request, in order.
    pub scheduled_moves: Vec<ScheduledMove>,
    /// Every `spawn_area_trigger` request, in order.
    pub area_trigger_calls: Vec<AreaTriggerCall>,
    /// Whether `show_boot_banner` has been called.
    pub boot_banner_shown: bool,
    /// If set, `spawn_area_trigger` fails with this error instead of recording the call.
    pub area_trigger_unavailable: bool,
}

impl MockHost {
    /// Builds an empty mock host with a fixed RNG seed for reproducible tests.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            graphics: HashMap::new(),
            doors: HashMap::new(),
            windows: HashMap::new(),
            paths: HashMap::new(),
            pages: HashMap::new(),
            characters: HashMap::new(),
            sheet_items: HashMap::new(),
            macros: HashMap::new(),
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
            deliveries: Vec::new(),
            scheduled_moves: Vec::new(),
            area_trigger_calls: Vec::new(),
            boot_banner_shown: false,
            area_trigger_unavailable: false,
        }
    }

    /// Inserts or replaces a graphic in the object graph.
    pub fn put_graphic(&mut self, graphic: Graphic) {
        self.graphics.insert(graphic.id.clone(), graphic);
    }

    /// Inserts or replaces a door.
    pub fn put_door(&mut self, door: Door) {
        self.doors.insert(door.id.clone(), door);
    }

    /// Inserts or replaces a window.
    pub fn put_window(&mut self, window: Window) {
        self.windows.insert(window.id.clone(), window);
    }

    /// Inserts or replaces a dynamic-lighting path.
    pub fn put_path(&mut self, path: PathObj) {
        self.paths.insert(path.id.clone(), path);
    }

    /// Inserts or replaces a page.
    pub fn put_page(&mut self, page: Page) {
        self.pages.insert(page.id.clone(), page);
    }

    /// Inserts or replaces a character.
    pub fn put_character(&mut self, character: Character) {
        self.characters.insert(character.id.clone(), character);
    }

    /// Sets a sheet-item value returned by `read_sheet_item`.
    pub fn set_sheet_item(&mut self, character_id: CharacterId, field: &str, value: f64) {
        self.sheet_items.insert((character_id, field.to_string()), value);
    }

    /// Registers a named macro's body text, looked up by `macro_body`.
    pub fn put_macro(&mut self, name: &str, body: &str) {
        self.macros.insert(name.to_string(), body.to_string());
    }

    /// Applies every recorded scheduled move directly and clears the log,
    /// simulating the delay having elapsed.
    pub fn run_scheduled_moves(&mut self) {
        let moves = std::mem::take(&mut self.scheduled_moves);
        for scheduled in moves {
            if let Some(graphic) = self.graphics.get_mut(&scheduled.token_id) {
                graphic.center = scheduled.target;
            }
        }
    }
}

#[async_trait]
impl HostPort for MockHost {
    fn graphic(&self, id: &TokenId) -> Option<Graphic> {
        self.graphics.get(id).cloned()
    }

    fn graphics_on_page(&self, page_id: &PageId) -> Vec<Graphic> {
        let mut graphics: Vec<_> = self
            .graphics
            .values()
            .filter(|g| &g.page_id == page_id)
            .cloned()
            .collect();
        graphics.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        graphics
    }

    fn set_graphic(&mut self, graphic: Graphic) -> Result<(), HostError> {
        if !self.graphics.contains_key(&graphic.id) {
            return Err(HostError::ObjectMissing(graphic.id.to_string()));
        }
        self.graphics.insert(graphic.id.clone(), graphic);
        Ok(())
    }

    fn door(&self, id: &TokenId) -> Option<Door> {
        self.doors.get(id).cloned()
    }

    fn doors_on_page(&self, page_id: &PageId) -> Vec<Door> {
        self.doors
            .values()
            .filter(|d| &d.page_id == page_id)
            .cloned()
            .collect()
    }

    fn door_paths_on_page(&self, page_id: &PageId) -> Vec<PathObj> {
        self.paths
            .values()
            .filter(|p| &p.page_id == page_id && p.is_door_path)
            .cloned()
            .collect()
    }

    fn windows_on_page(&self, page_id: &PageId) -> Vec<Window> {
        self.windows
            .values()
            .filter(|w| &w.page_id == page_id)
            .cloned()
            .collect()
    }

    fn paths_on_page(&self, page_id: &PageId) -> Vec<PathObj> {
        self.paths
            .values()
            .filter(|p| &p.page_id == page_id)
            .cloned()
            .collect()
    }

    fn page(&self, page_id: &PageId) -> Option<Page> {
        self.pages.get(page_id).cloned()
    }

    fn character(&self, id: &CharacterId) -> Option<Character> {
        self.characters.get(id).cloned()
    }

    fn macro_body(&self, name: &str) -> Option<String> {
        self.macros.get(name).cloned()
    }

    fn read_attribute(&self, character_id: &CharacterId, name: &str) -> Option<f64> {
        self.sheet_items.get(&(character_id.clone(), name.to_string())).copied()
    }

    async fn read_sheet_item(&self, character_id: &CharacterId, name: &str) -> Option<f64> {
        self.sheet_items.get(&(character_id.clone(), name.to_string())).copied()
    }

    fn roll_dice(&self, count: u32, sides: u32) -> i32 {
        let mut rng = self.rng.borrow_mut();
        (0..count).map(|_| i32::try_from(rng.gen_range(1..=sides)).unwrap_or(i32::MAX)).sum()
    }

    fn send_chat(&mut self, page_id: &PageId, message: ChatMessage) {
        self.deliveries.push(Delivery::Chat {
            page_id: page_id.clone(),
            message,
        });
    }

    fn whisper(&mut self, to: &Recipient, body: &str) {
        self.deliveries.push(Delivery::Whisper {
            to: to.clone(),
            body: body.to_string(),
        });
    }

    async fn schedule_delayed_move(&mut self, token_id: TokenId, target: Vec2, delay_ms: u64) {
        self.scheduled_moves.push(ScheduledMove {
            token_id,
            target,
            delay_ms,
        });
    }

    async fn spawn_area_trigger(
        &mut self,
        tag: &str,
        radius_ft: f64,
        action_macro: &str,
        is_per_token: bool,
        origin: Vec2,
        page_id: &PageId,
    ) -> Result<(), HostError> {
        if self.area_trigger_unavailable {
            return Err(HostError::AreaTriggerUnavailable);
        }
        self.area_trigger_calls.push(AreaTriggerCall {
            tag: tag.to_string(),
            radius_ft,
            action_macro: action_macro.to_string(),
            is_per_token,
            origin,
            page_id: page_id.clone(),
        });
        Ok(())
    }

    fn show_boot_banner(&mut self) {
        self.boot_banner_shown = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Layer;

    fn sample_graphic(id: &str, page_id: &str) -> Graphic {
        Graphic {
            id: TokenId::from(id),
            page_id: PageId::from(page_id),
            center: Vec2::new(100.0, 100.0),
            width: 70.0,
            height: 70.0,
            rotation: 0.0,
            notes: String::new(),
            layer: Layer::Object,
            status_markers: Vec::new(),
            represents: None,
            aura1_radius: None,
            aura1_color: None,
            aura2_radius: None,
            aura2_color: None,
            bar1_value: None,
            bar1_max: None,
            bar2_value: None,
        }
    }

    #[tokio::test]
    async fn graphics_on_page_filters_and_sorts() {
        let mut host = MockHost::new(1);
        host.put_graphic(sample_graphic("b", "page-1"));
        host.put_graphic(sample_graphic("a", "page-1"));
        host.put_graphic(sample_graphic("c", "page-2"));

        let ids: Vec<_> = host
            .graphics_on_page(&PageId::from("page-1"))
            .into_iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(ids, vec![TokenId::from("a"), TokenId::from("b")]);
    }

    #[tokio::test]
    async fn set_graphic_on_unknown_id_errors() {
        let mut host = MockHost::new(1);
        let result = host.set_graphic(sample_graphic("missing", "page-1"));
        assert!(matches!(result, Err(HostError::ObjectMissing(_))));
    }

    #[tokio::test]
    async fn scheduled_moves_apply_on_run() {
        let mut host = MockHost::new(1);
        host.put_graphic(sample_graphic("tok", "page-1"));
        host.schedule_delayed_move(TokenId::from("tok"), Vec2::new(200.0, 200.0), 300).await;
        assert_eq!(host.scheduled_moves.len(), 1);
        host.run_scheduled_moves();
        assert!(host.scheduled_moves.is_empty());
        assert_eq!(host.graphic(&TokenId::from("tok")).unwrap().center, Vec2::new(200.0, 200.0));
    }

    #[tokio::test]
    async fn area_trigger_unavailable_flag_errors() {
        let mut host = MockHost::new(1);
        host.area_trigger_unavailable = true;
        let result = host
            .spawn_area_trigger("fx", 10.0, "!spawnComplexFx", false, Vec2::ZERO, &PageId::from("page-1"))
            .await;
        assert!(matches!(result, Err(HostError::AreaTriggerUnavailable)));
    }

    #[test]
    fn roll_dice_stays_in_range() {
        let host = MockHost::new(42);
        for _ in 0..50 {
            let total = host.roll_dice(2, 6);
            assert!((2..=12).contains(&total));
        }
    }
}
