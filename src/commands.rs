use crate::aliases::AliasTable;
use crate::catalog::CatalogStore;
use crate::constants::{ATTACHMENT_COLOR, AVAILABLE_SIZES, STICKER_ICON_EMOJI};
use crate::metrics::CommandMetrics;
use crate::resolver::Resolver;
use crate::slack::{Attachment, SlackPayload};
use crate::types::ChatSink;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fmt::Write;
use std::sync::Arc;
use tracing::{info, instrument};

static ALIAS_ARGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^alias ([a-z0-9]+) (.+)$").expect("alias pattern is valid"));
static UNALIAS_ARGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^unalias (.+)$").expect("unalias pattern is valid"));
static SIZE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s+(\S.*)$").expect("size pattern is valid"));

pub const ALIAS_USAGE: &str = "Type /sticker alias <sticker ID> <new alias>";
pub const UNALIAS_USAGE: &str = "Type /sticker unalias <alias>";
pub const NOT_FOUND: &str = "Couldn't find that sticker or image at that size";

/// Form fields of a slash-command request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlashRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub channel_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Sizes,
    Aliases,
    Alias { id: String, alias: String },
    AliasUsage,
    Unalias { alias: String },
    UnaliasUsage,
    Warmup,
    Send { size: u32, query: String },
}

impl Command {
    /// Splits command text into a verb and its arguments. Anything that is not a known verb
    /// is a sticker request with an optional leading size.
    pub fn parse(text: &str, default_size: u32) -> Self {
        let trimmed = text.trim();
        let verb = trimmed.split_whitespace().next().unwrap_or_default();

        match verb {
            "list" if trimmed == "list" => Command::List,
            "sizes" if trimmed == "sizes" => Command::Sizes,
            "aliases" if trimmed == "aliases" => Command::Aliases,
            "warmup" if trimmed == "warmup" => Command::Warmup,
            "alias" => match ALIAS_ARGS.captures(trimmed) {
                Some(caps) => Command::Alias {
                    id: caps[1].to_string(),
                    alias: caps[2].to_string(),
                },
                None => Command::AliasUsage,
            },
            "unalias" => match UNALIAS_ARGS.captures(trimmed) {
                Some(caps) => Command::Unalias {
                    alias: caps[1].to_string(),
                },
                None => Command::UnaliasUsage,
            },
            _ => match SIZE_PREFIX.captures(trimmed) {
                Some(caps) => match caps[1].parse::<u32>() {
                    Ok(size) => Command::Send {
                        size,
                        query: caps[2].to_string(),
                    },
                    Err(_) => Command::Send {
                        size: default_size,
                        query: trimmed.to_string(),
                    },
                },
                None => Command::Send {
                    size: default_size,
                    query: trimmed.to_string(),
                },
            },
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            Command::List => "list",
            Command::Sizes => "sizes",
            Command::Aliases => "aliases",
            Command::Alias { .. } | Command::AliasUsage => "alias",
            Command::Unalias { .. } | Command::UnaliasUsage => "unalias",
            Command::Warmup => "warmup",
            Command::Send { .. } => "send",
        }
    }
}

/// Executes slash commands against the shared catalog and alias table.
pub struct CommandHandler {
    catalog: Arc<CatalogStore>,
    aliases: Arc<AliasTable>,
    resolver: Resolver,
    chat: Arc<dyn ChatSink>,
    default_size: u32,
}

impl CommandHandler {
    pub fn new(
        catalog: Arc<CatalogStore>,
        aliases: Arc<AliasTable>,
        chat: Arc<dyn ChatSink>,
        default_size: u32,
    ) -> Self {
        Self {
            resolver: Resolver::new(catalog.clone(), aliases.clone()),
            catalog,
            aliases,
            chat,
            default_size,
        }
    }

    /// Plain-text reply for a request that already passed the token check.
    #[instrument(skip(self, request), fields(user = %request.user_name, text = %request.text))]
    pub async fn handle(&self, request: &SlashRequest) -> String {
        let command = Command::parse(&request.text, self.default_size);
        CommandMetrics::record_command(command.verb());

        match command {
            Command::List => self.list(),
            Command::Sizes => sizes(),
            Command::Aliases => self.list_aliases(),
            Command::Alias { id, alias } => self.add_alias(&id, &alias),
            Command::AliasUsage => ALIAS_USAGE.to_string(),
            Command::Unalias { alias } => {
                if self.aliases.remove(&alias) {
                    "Removed that alias".to_string()
                } else {
                    "No such alias to remove".to_string()
                }
            }
            Command::UnaliasUsage => UNALIAS_USAGE.to_string(),
            Command::Warmup => "OK, Ready".to_string(),
            Command::Send { size, query } => self.send(request, size, &query).await,
        }
    }

    fn list(&self) -> String {
        let mut buf = String::from("The following stickers are available:\n");
        for entry in self.catalog.all().iter() {
            let _ = writeln!(buf, "- {} [{}]", entry.name(), entry.id());
        }
        buf
    }

    fn list_aliases(&self) -> String {
        let mut buf = String::from("The following aliases are available:\n");
        for (id, aliases) in self.aliases.snapshot() {
            if let Some(entry) = self.catalog.find_by_id(&id) {
                let _ = writeln!(buf, "{}: {}", entry.name(), aliases.join(", "));
            }
        }
        buf.push_str(
            "(Type /sticker alias <sticker ID> <new alias> to create a new alias. \
             Type /sticker unalias <alias> to remove an alias.)\n",
        );
        buf
    }

    fn add_alias(&self, id: &str, alias: &str) -> String {
        match self.catalog.find_by_id(id) {
            Some(entry) => {
                let stored = self.aliases.add(entry.id(), alias);
                info!(id = %entry.id(), alias = %stored, "Alias created");
                format!("Aliased {} to \"{}\"", entry.id(), stored)
            }
            None => format!("Sticker with ID {id} not found"),
        }
    }

    async fn send(&self, request: &SlashRequest, size: u32, query: &str) -> String {
        let found = self
            .resolver
            .resolve(query)
            .and_then(|hit| hit.entry.image_url(size).map(|url| (hit, url)));

        let Some((hit, image_url)) = found else {
            CommandMetrics::record_resolution(false);
            return NOT_FOUND.to_string();
        };
        CommandMetrics::record_resolution(true);
        info!(id = %hit.entry.id(), kind = ?hit.kind, size, "Sending sticker");

        let payload = SlackPayload {
            username: request.user_name.clone(),
            icon_emoji: STICKER_ICON_EMOJI.to_string(),
            channel: request.channel_id.clone(),
            text: None,
            attachments: vec![Attachment {
                fallback: hit.entry.name().to_string(),
                color: ATTACHMENT_COLOR.to_string(),
                image_url,
            }],
        };

        match self.chat.post(&payload).await {
            Ok(()) => String::new(),
            Err(e) => {
                CommandMetrics::record_delivery_error();
                e.to_string()
            }
        }
    }
}

fn sizes() -> String {
    let sizes: Vec<String> = AVAILABLE_SIZES.iter().map(u32::to_string).collect();
    format!(
        "Available sizes: {}\nType /sticker [size] [name or oid] to use a specified size.",
        sizes.join(", ")
    )
}
