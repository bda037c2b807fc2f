// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Action Runner (C7): dispatch of one action string (§4.7).

use crate::error::EngineError;
use std::collections::HashMap;
use trap_domain::{PageId, TokenId, TrapId};
use trap_geom::Vec2;
use trap_host::types::{ChatMessage, Recipient};
use trap_host::HostPort;

const TRIGGER_BY_TAG_PREFIX: &str = "!triggerbytag";
const LEGACY_FX_PREFIX: &str = "/fx";

/// Which family a single line of an action body belongs to, decided by its
/// leading character after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// `#Name` — a named macro reference, resolved via [`HostPort::macro_body`].
    MacroRef(String),
    /// `!cmd ...` (or its `$` authoring alias) — a host API command.
    Command(String),
    /// `&{template:...}` — a chat template payload.
    Template(String),
    /// Anything else — plain chat text.
    Chat(String),
}

/// Classifies one action-string body by its leading character.
#[must_use]
pub fn classify(body: &str) -> ActionKind {
    let trimmed = body.trim();
    match trimmed.chars().next() {
        Some('#') => ActionKind::MacroRef(trimmed[1..].trim().to_string()),
        Some('!') => ActionKind::Command(trimmed[1..].trim().to_string()),
        Some('$') => ActionKind::Command(trimmed[1..].trim().to_string()),
        Some('&') => ActionKind::Template(trimmed.to_string()),
        _ => ActionKind::Chat(trimmed.to_string()),
    }
}

/// The substitution/addressing context for one action run.
pub struct ActionContext<'a> {
    /// The trap running this action (`<&trap>` / `@{selected|token_id}`).
    pub trap_id: &'a TrapId,
    /// The token currently locked to the trap, if any (`<&trapped>`).
    pub trapped_token_id: Option<&'a TokenId>,
    /// The first target token, if any (`@{target|token_id}`).
    pub target_token_id: Option<&'a TokenId>,
    /// Extra named substitution tags (`<&name>`).
    pub extra_tags: &'a HashMap<String, String>,
    /// Trap center, used as the area-trigger collaborator's origin.
    pub origin: Vec2,
    /// Page the trap lives on.
    pub page_id: &'a PageId,
}

fn substitute(body: &str, ctx: &ActionContext<'_>) -> String {
    let mut out = body.to_string();
    out = out.replace("<&trap>", ctx.trap_id.as_str());
    out = out.replace("<&trapped>", ctx.trapped_token_id.map(TokenId::as_str).unwrap_or(""));
    out = out.replace("@{selected|token_id}", ctx.trap_id.as_str());
    out = out.replace("@{target|token_id}", ctx.target_token_id.map(TokenId::as_str).unwrap_or(""));
    for (name, value) in ctx.extra_tags {
        out = out.replace(&format!("<&{name}>"), value);
    }
    out
}

/// Rewrites a legacy `/fx type[-color] target` line into the area-trigger
/// collaborator's `!spawnComplexFx` command form, preserving the target
/// placeholder for the substitution pass.
fn convert_legacy_fx_line(line: &str) -> String {
    let rest = line.trim()[LEGACY_FX_PREFIX.len()..].trim();
    let mut parts = rest.splitn(2, char::is_whitespace);
    let fx_type = parts.next().unwrap_or_default();
    let target = parts.next().unwrap_or_default().trim();
    format!("!spawnComplexFx --fx {fx_type} --target {target}")
}

/// One `!triggerByTag <tag> <radiusFt> <action>` line, parsed out of an
/// action body.
struct TriggerByTag {
    tag: String,
    radius_ft: f64,
    action: String,
}

fn parse_trigger_by_tag(line: &str) -> Result<TriggerByTag, EngineError> {
    let rest = line.trim()[TRIGGER_BY_TAG_PREFIX.len()..].trim();
    let mut parts = rest.splitn(3, char::is_whitespace);
    let tag = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| EngineError::ActionExecutionFailure(format!("malformed !triggerByTag line: {line}")))?;
    let radius_str = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| EngineError::ActionExecutionFailure(format!("malformed !triggerByTag line: {line}")))?;
    let radius_ft: f64 = radius_str
        .parse()
        .map_err(|_| EngineError::ActionExecutionFailure(format!("malformed !triggerByTag radius: {radius_str}")))?;
    let action = parts.next().unwrap_or_default().to_string();
    Ok(TriggerByTag {
        tag: tag.to_string(),
        radius_ft,
        action,
    })
}

/// Separates `!triggerByTag` lines from the rest of an action body,
/// returning the remaining body (lines in original order) and the separated
/// lines (parsed).
fn separate_trigger_by_tag(body: &str) -> (String, Vec<TriggerByTag>) {
    let mut remaining = Vec::new();
    let mut separated = Vec::new();
    for line in body.lines() {
        if line.trim().to_lowercase().starts_with(TRIGGER_BY_TAG_PREFIX) {
            match parse_trigger_by_tag(line) {
                Ok(parsed) => separated.push(parsed),
                Err(_) => remaining.push(line.to_string()),
            }
        } else {
            remaining.push(line.to_string());
        }
    }
    (remaining.join("\n"), separated)
}

fn convert_legacy_fx(body: &str) -> String {
    body.lines()
        .map(|line| {
            if line.trim().to_lowercase().starts_with(LEGACY_FX_PREFIX) {
                convert_legacy_fx_line(line)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Injects `--ids {default_id}` into a command line that does not already
/// name an explicit id set.
fn inject_ids(command: &str, default_id: &str) -> String {
    if command.contains("--ids") {
        command.to_string()
    } else {
        format!("{command} --ids {default_id}")
    }
}

/// Splits a substituted action body into three dispatch lanes.
fn split_lanes(body: &str) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut chat = Vec::new();
    let mut templates = Vec::new();
    let mut commands = Vec::new();
    for line in body.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match classify(line) {
            ActionKind::Command(cmd) => commands.push(cmd),
            ActionKind::Template(tpl) => templates.push(tpl),
            ActionKind::Chat(text) | ActionKind::MacroRef(text) => chat.push(text),
        }
    }
    (chat, templates, commands)
}

/// Runs one action string end to end: macro resolution, `!triggerByTag`
/// separation, legacy `/fx` conversion, tag substitution, and three-lane
/// dispatch with `--ids` injection (§4.7).
///
/// Non-fatal failures (a malformed `!triggerByTag` line or an unavailable
/// area-trigger collaborator) are whispered to the GM and do not abort
/// already-dispatched lanes. The only case returned as `Err` is a top-level
/// `#Name` reference to an unknown macro, which has no body to run at all.
pub async fn run_action(host: &mut dyn HostPort, raw: &str, ctx: &ActionContext<'_>) -> Result<(), EngineError> {
    let body = match classify(raw) {
        ActionKind::MacroRef(name) => host
            .macro_body(&name)
            .ok_or_else(|| EngineError::ActionExecutionFailure(format!("unknown macro: {name}")))?,
        _ => raw.to_string(),
    };

    let (remaining, triggers) = separate_trigger_by_tag(&body);
    let converted = convert_legacy_fx(&remaining);
    let substituted = substitute(&converted, ctx);

    let default_id = ctx.trapped_token_id.map_or_else(|| ctx.trap_id.as_str(), TokenId::as_str).to_string();
    let (chat_lines, template_lines, command_lines) = split_lanes(&substituted);

    if !chat_lines.is_empty() {
        host.send_chat(
            ctx.page_id,
            ChatMessage {
                from: ctx.trap_id.to_string(),
                body: chat_lines.join("\n"),
            },
        );
    }
    for template in &template_lines {
        host.send_chat(
            ctx.page_id,
            ChatMessage {
                from: ctx.trap_id.to_string(),
                body: template.clone(),
            },
        );
    }
    for command in &command_lines {
        let with_ids = inject_ids(command, &default_id);
        host.send_chat(
            ctx.page_id,
            ChatMessage {
                from: ctx.trap_id.to_string(),
                body: format!("!{with_ids}"),
            },
        );
    }

    for trigger in triggers {
        let substituted_action = substitute(&trigger.action, ctx);
        let result = host
            .spawn_area_trigger(&trigger.tag, trigger.radius_ft, &substituted_action, false, ctx.origin, ctx.page_id)
            .await;
        if result.is_err() {
            host.whisper(
                &Recipient::Gm,
                &format!("area-trigger collaborator unavailable for tag `{}`", trigger.tag),
            );
        }
    }

    Ok(())
}
