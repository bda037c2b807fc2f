// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `HostPort`: the trait boundary between the engine and the map platform (§6).

use crate::error::HostError;
use crate::types::{ChatMessage, Character, Door, Graphic, Page, PathObj, Recipient, Window};
use async_trait::async_trait;
use trap_domain::{CharacterId, PageId, PlayerId, TokenId};
use trap_geom::Vec2;

/// The host object API the engine consumes (§6), plus the two out-of-scope
/// collaborators (area-trigger runner, command-menu boot banner) the engine
/// only needs an interface for.
///
/// The two legitimate suspension points from §5 — a sheet-attribute read and
/// a host-scheduled delayed move — are the only `async fn`s here; every other
/// method is synchronous, matching the host's otherwise-synchronous object
/// graph.
#[async_trait]
pub trait HostPort: Send {
    /// Looks up a single graphic (token or trap object) by id.
    fn graphic(&self, id: &TokenId) -> Option<Graphic>;
    /// All graphics on `page_id`, in host scan order.
    fn graphics_on_page(&self, page_id: &PageId) -> Vec<Graphic>;
    /// Writes back a graphic's mutable fields (position, notes, auras, bars,
    /// status markers). Implementations update only the fields that differ.
    fn set_graphic(&mut self, graphic: Graphic) -> Result<(), HostError>;

    /// Looks up a door by id.
    fn door(&self, id: &TokenId) -> Option<Door>;
    /// All doors on `page_id`.
    fn doors_on_page(&self, page_id: &PageId) -> Vec<Door>;
    /// All legacy door-paths on `page_id` (a subset of `paths_on_page`).
    fn door_paths_on_page(&self, page_id: &PageId) -> Vec<PathObj>;
    /// All windows on `page_id`.
    fn windows_on_page(&self, page_id: &PageId) -> Vec<Window>;
    /// All dynamic-lighting wall paths on `page_id`.
    fn paths_on_page(&self, page_id: &PageId) -> Vec<PathObj>;

    /// Page-level grid settings.
    fn page(&self, page_id: &PageId) -> Option<Page>;

    /// Looks up a character sheet by id.
    fn character(&self, id: &CharacterId) -> Option<Character>;

    /// Looks up a named macro's body text (the `#Name` action form).
    fn macro_body(&self, name: &str) -> Option<String>;

    /// Reads a numeric attribute by name via the attribute API.
    fn read_attribute(&self, character_id: &CharacterId, name: &str) -> Option<f64>;
    /// Reads a sheet-worker-computed field. Modeled as the async suspension
    /// point named in §5; may legitimately be slower than `read_attribute`.
    async fn read_sheet_item(&self, character_id: &CharacterId, name: &str) -> Option<f64>;

    /// Rolls `count` uniformly random integers in `1..=sides` and returns
    /// their sum (the host's `randomInteger(n)` primitive, called once per die).
    fn roll_dice(&self, count: u32, sides: u32) -> i32;

    /// Sends a chat message to the page's chat log.
    fn send_chat(&mut self, page_id: &PageId, message: ChatMessage);
    /// Whispers a message to a single recipient.
    fn whisper(&mut self, to: &Recipient, body: &str);

    /// Schedules `token_id` to move to `target` after `delay_ms`, used for the
    /// two-step occupancy-adjusted move in §4.5 step 4. The second suspension
    /// point named in §5.
    async fn schedule_delayed_move(&mut self, token_id: TokenId, target: Vec2, delay_ms: u64);

    /// Dispatches a tag to the external area-trigger effects runner.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::AreaTriggerUnavailable`] if the collaborator is
    /// not present — out of scope, interface only.
    async fn spawn_area_trigger(
        &mut self,
        tag: &str,
        radius_ft: f64,
        action_macro: &str,
        is_per_token: bool,
        origin: Vec2,
        page_id: &PageId,
    ) -> Result<(), HostError>;

    /// Surfaces the command-menu system's boot banner. Out of scope body,
    /// interface only.
    fn show_boot_banner(&mut self);
}

/// Parses the host's comma-separated controller-id list into `PlayerId`s,
/// skipping the empty entries a trailing/leading comma would produce.
#[must_use]
pub fn parse_controlled_by(raw: &str) -> Vec<PlayerId> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PlayerId::from)
        .collect()
}
