//! # Notes on the Localization Domain
//!
//! RPG Maker data is organized very differently across engine
//! generations. XP/VX/VX Ace serialize the whole database with Ruby's
//! `Marshal` format and keep scripts zlib-compressed inside
//! `Scripts.rvdata2`; MV/MZ instead lay everything out as plain JSON
//! plus a JS-ish `plugins.js` prelude. This module collects every
//! constant both halves of the pipeline need to agree on: the
//! placeholder bracket characters, the merge separator, the event
//! command code tables, and the several field-name whitelists the
//! extractor consults.
//!
//! Nothing here is engine-specific machinery, just shared vocabulary,
//! so it lives in one place rather than being duplicated between
//! `json_core` and `ruby`.

/// Opening bracket of a placeholder key. Chosen (by the source spec) to
/// be culture-neutral so no natural-language translation would ever
/// emit it on its own.
pub const PLACEHOLDER_OPEN: char = '\u{27E6}';

/// Closing bracket of a placeholder key.
pub const PLACEHOLDER_CLOSE: char = '\u{27E7}';

/// ASCII body prefix shared by every placeholder key.
pub const PLACEHOLDER_BODY: &str = "RLPH_";

/// Separator used by the text merger to join batched lines. Padded
/// with newlines at each join point.
pub const LINE_BREAK_TOKEN: &str = "|||XLB|||";

/// Default item-count ceiling for a merged batch.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Estimated per-item overhead (separator + surrounding newlines) added
/// to the predicted character length of a batch.
pub const MERGE_OVERHEAD_PER_ITEM: usize = LINE_BREAK_TOKEN.len() + 2;

/// Safe character-length ceiling for one merged batch request.
pub const MERGE_MAX_SAFE_CHARS: usize = 4000;

/// Recursion depth guard for the Ruby Marshal tree walker.
pub const MARSHAL_MAX_DEPTH: usize = 100;

/// Fallback encodings tried in order when decoding a Ruby byte string.
pub const RUBY_ENCODING_FALLBACK: &[&str] =
    &[ "utf-8", "shift_jis", "cp1252", "iso-8859-1" ];


/// Database field names always considered translatable when their
/// value is a string that passes the safety filter. Shared between the
/// JSON and Marshal extractors (§4.5/§4.6 name largely the same set).
pub const DATABASE_FIELD_WHITELIST: &[&str] = &[
    "name", "description", "nickname", "profile",
    "message1", "message2", "message3", "message4",
    "gameTitle", "title", "message", "help", "text", "msg",
    "dialogue", "label", "format", "string", "prefix", "suffix",
    "commandName", "displayName", "currencyUnit", "locale", "battleName",
];

/// Additional attribute names recognized only on the Ruby/Marshal side
/// (snake_case counterparts of the JSON whitelist, plus a few that have
/// no JSON equivalent).
pub const MARSHAL_FIELD_WHITELIST: &[&str] = &[
    "name", "description", "nickname", "profile",
    "message1", "message2", "message3", "message4",
    "help", "title", "display_name", "text", "msg", "message",
    "game_title", "currency_unit",
];

/// Fields that are structurally present alongside translatable text but
/// are never themselves translatable.
pub const SKIP_FIELDS: &[&str] = &[
    "id", "animationId", "characterIndex", "characterName",
    "faceName", "faceIndex", "tilesetId",
    "battleback1Name", "battleback2Name",
    "bgm", "bgs", "parallaxName",
    "title1Name", "title2Name",
    "note",
];

/// Keys that, when all present together on one object, mark it as a
/// sound descriptor whose `name` is a filename, not prose.
pub const SOUND_OBJECT_KEYS: &[&str] = &[ "name", "volume", "pitch", "pan" ];

/// `System.json` term-table keys: lists/dicts of UI vocabulary
/// (attack/defense labels, equip slot names, …) that read like database
/// fields but live one level deeper, under one of these container keys.
pub const SYSTEM_TERM_KEYS: &[&str] = &[
    "basic", "commands", "params", "messages",
    "elements", "skillTypes", "weaponTypes", "armorTypes", "equipTypes",
    "terms", "types",
    "etypeNames", "stypeNames", "wtypeNames", "atypeNames",
];

/// Substrings that mark a plugin-parameter key as asset-shaped, so a
/// path-like value under it is treated as a filename rather than text.
pub const ASSET_KEY_HINTS: &[&str] = &[
    "picture", "face", "battler", "filename", "image", "icon",
    "graphic", "sprite",
];

/// Substrings that mark a plugin-parameter key as text-bearing. This is
/// the more permissive of the two competing whitelists in the source
/// (see DESIGN.md Open Question 1) and is used wherever a field-name
/// whitelist is consulted outside the strict database field list.
pub const TEXT_KEY_INDICATORS: &[&str] = &[
    "text", "message", "name", "format", "msg", "desc", "title",
    "label", "caption", "header", "footer", "help", "hint", "tooltip",
    "popup", "notification", "dialogue", "dialog", "menu", "command",
    "option", "button", "string", "content", "display", "info",
    "quest", "journal", "log", "story", "victory", "defeat", "battle",
    "escape", "objective", "task",
];

/// VisuStella-style key suffixes that mark the value as code, not text.
pub const CODE_KEY_SUFFIXES: &[&str] = &[ ":func", ":eval", ":json", ":code", ":js" ];

/// VisuStella-style key suffixes that mark the value as translatable
/// text despite looking like a parameter.
pub const TEXT_KEY_SUFFIXES: &[&str] = &[ ":str", ":num" ];

/// Message-bearing note-tag names (case-insensitive) whose value/body
/// is always translatable.
pub const NOTE_TAG_TEXT_WHITELIST: &[&str] = &[
    "description", "help description", "help", "flavor text",
    "custom death message", "victory message", "defeat message",
    "quest description", "journal entry", "battle message",
];

/// Technical note-tag names whose value is never translatable
/// regardless of how prose-like it looks.
pub const NOTE_TAG_SKIP_LIST: &[&str] = &[
    "mhp", "mmp", "atk", "def", "mat", "mdf", "agi", "luk",
    "id", "type", "formula", "timing", "cooldown", "speed",
    "rate", "element", "icon", "animation",
];


/// Event command codes and the parameter positions they expose,
/// shared by the generic walker in both `json_core` and `ruby`.
pub mod event_code {
    /// Show Text line / Scroll Text line — `parameters.0`.
    pub const SHOW_TEXT_LINE: i64 = 401;
    pub const SCROLL_TEXT_LINE: i64 = 405;
    /// Show Text header — `parameters.4` (speaker name).
    pub const SHOW_TEXT_HEADER: i64 = 101;
    /// Show Choices — `parameters.0.i` for each string choice.
    pub const SHOW_CHOICES: i64 = 102;
    /// When-choice label — `parameters.1`.
    pub const WHEN_CHOICE_LABEL: i64 = 402;
    /// Scroll-text header (extended) — `parameters.2` if present.
    pub const SCROLL_TEXT_HEADER: i64 = 105;
    /// Comment / comment continuation.
    pub const COMMENT: i64 = 108;
    pub const COMMENT_CONT: i64 = 408;
    /// Change actor name/nickname/profile — `parameters.1`.
    pub const CHANGE_NAME: i64 = 320;
    pub const CHANGE_NICKNAME: i64 = 324;
    pub const CHANGE_PROFILE: i64 = 325;
    /// MV plugin command — `parameters.0`.
    pub const PLUGIN_COMMAND_MV: i64 = 356;
    /// MZ plugin command (+ continuation) — `parameters.2`, recurse `parameters.3`.
    pub const PLUGIN_COMMAND_MZ: i64 = 357;
    pub const PLUGIN_COMMAND_MZ_CONT: i64 = 657;
    /// Script (+ continuation), tokenized as JS.
    pub const SCRIPT: i64 = 355;
    pub const SCRIPT_CONT: i64 = 655;
}
