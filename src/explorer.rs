use std::sync::Arc;

use tokio::{
    io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter},
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
};
use tracing::{debug, info};

use crate::{
    client::{
        ExplorerApi,
        hook::{FetchTicket, TokenPriceQuery},
        render::{render_panel, render_token_list},
        selection::{Selection, Slot},
        selector::{DynamicTokenSelector, FixedTokenSelector, SelectableToken},
    },
    error::AppResult,
    implementations::conversion::sanitize_usd_input,
    types::{TokenPriceOut, TokensOut},
};

const HELP: &str = "commands: pick <n> | usd <amount> | chain <id> | mode simple|advanced | show | help | quit";

/// Completion of a background fetch.
#[derive(Debug)]
pub enum ExplorerEvent {
    Price {
        slot: Slot,
        ticket: FetchTicket,
        result: AppResult<TokenPriceOut>,
    },
    InitialTokens(AppResult<TokensOut>),
    Tokens {
        chain_id: String,
        result: AppResult<TokensOut>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Pick(usize),
    Usd(String),
    Chain(String),
    Mode { advanced: bool },
    Show,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Ok(Command::Show);
        };
        let arg = parts.next();

        match (verb.to_ascii_lowercase().as_str(), arg) {
            ("pick" | "p", Some(raw)) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .map(Command::Pick)
                .ok_or_else(|| format!("not a token number: {raw}")),
            ("usd" | "u", value) => Ok(Command::Usd(value.unwrap_or_default().to_string())),
            ("chain" | "c", Some(id)) => Ok(Command::Chain(id.to_string())),
            ("mode" | "m", Some("advanced")) => Ok(Command::Mode { advanced: true }),
            ("mode" | "m", Some("simple")) => Ok(Command::Mode { advanced: false }),
            ("show" | "s", None) => Ok(Command::Show),
            ("help" | "h" | "?", _) => Ok(Command::Help),
            ("quit" | "q" | "exit", _) => Ok(Command::Quit),
            _ => Err(format!("unrecognised command: {}", line.trim())),
        }
    }
}

/// Terminal front end: two selectors, one selection, one price query per slot.
pub struct Explorer<A: ExplorerApi + 'static> {
    api: Arc<A>,
    advanced: bool,
    fixed: FixedTokenSelector,
    dynamic: DynamicTokenSelector,
    selection: Selection<SelectableToken>,
    usd_amount: String,
    source: TokenPriceQuery,
    target: TokenPriceQuery,
    events: UnboundedSender<ExplorerEvent>,
}

impl<A: ExplorerApi + 'static> Explorer<A> {
    pub fn new(api: Arc<A>, advanced: bool) -> (Self, UnboundedReceiver<ExplorerEvent>) {
        let (events, receiver) = unbounded_channel();
        let mut explorer = Self {
            api,
            advanced: false,
            fixed: FixedTokenSelector::new(),
            dynamic: DynamicTokenSelector::new(),
            selection: Selection::new(),
            usd_amount: String::new(),
            source: TokenPriceQuery::new(),
            target: TokenPriceQuery::new(),
            events,
        };
        if advanced {
            explorer.set_mode(true);
        }
        (explorer, receiver)
    }

    pub fn is_advanced(&self) -> bool {
        self.advanced
    }

    pub fn selection(&self) -> &Selection<SelectableToken> {
        &self.selection
    }

    pub fn dynamic(&self) -> &DynamicTokenSelector {
        &self.dynamic
    }

    pub fn usd_amount(&self) -> &str {
        &self.usd_amount
    }

    pub fn query(&self, slot: Slot) -> &TokenPriceQuery {
        match slot {
            Slot::Source => &self.source,
            Slot::Target => &self.target,
        }
    }

    pub fn visible_tokens(&self) -> &[SelectableToken] {
        if self.advanced {
            self.dynamic.tokens()
        } else {
            self.fixed.tokens()
        }
    }

    /// Apply one command. Returns `false` when the user asked to quit, and a message to show
    /// instead of the full view when there is one.
    pub fn handle_command(&mut self, command: Command) -> (bool, Option<String>) {
        match command {
            Command::Pick(index) => {
                let token = index
                    .checked_sub(1)
                    .and_then(|i| self.visible_tokens().get(i))
                    .cloned();
                let Some(token) = token else {
                    return (true, Some(format!("no token #{index}")));
                };
                if self.selection.toggle(&token).is_none() {
                    return (true, Some("both slots are taken; deselect one first".into()));
                }
                self.sync_queries();
            }
            Command::Usd(value) => {
                self.usd_amount = sanitize_usd_input(&self.usd_amount, &value);
            }
            Command::Chain(chain_id) => {
                if !self.advanced {
                    return (true, Some("chain selection needs advanced mode".into()));
                }
                if let Some(chain_id) = self.dynamic.select_chain(&chain_id) {
                    self.spawn_tokens_fetch(Some(chain_id));
                }
            }
            Command::Mode { advanced } => {
                if advanced != self.advanced {
                    self.set_mode(advanced);
                }
            }
            Command::Show => {}
            Command::Help => return (true, Some(HELP.to_string())),
            Command::Quit => return (false, None),
        }
        (true, None)
    }

    pub fn handle_event(&mut self, event: ExplorerEvent) {
        match event {
            ExplorerEvent::Price {
                slot,
                ticket,
                result,
            } => {
                let query = match slot {
                    Slot::Source => &mut self.source,
                    Slot::Target => &mut self.target,
                };
                query.complete(&ticket, result);
            }
            ExplorerEvent::InitialTokens(result) => self.dynamic.apply_initial(result),
            ExplorerEvent::Tokens { chain_id, result } => {
                self.dynamic.apply_tokens(&chain_id, result)
            }
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(if self.advanced {
            "== Token Price Explorer (advanced) ==\n"
        } else {
            "== Token Price Explorer ==\n"
        });

        if self.advanced {
            if self.dynamic.is_loading_chains() {
                out.push_str("Loading chains...\n");
            } else {
                out.push_str(&format!(
                    "Chains: {} (selected: {})\n",
                    self.dynamic.chains().join(", "),
                    self.dynamic.selected_chain().unwrap_or("-")
                ));
            }
            if self.dynamic.is_loading_tokens() {
                out.push_str("Loading tokens...\n");
            }
        }

        out.push_str(&render_token_list(self.visible_tokens(), &self.selection));
        out.push('\n');
        out.push_str(&render_panel(
            Slot::Source,
            self.selection.source(),
            &self.source,
            &self.usd_amount,
        ));
        out.push_str("  ->\n");
        out.push_str(&render_panel(
            Slot::Target,
            self.selection.target(),
            &self.target,
            &self.usd_amount,
        ));
        out.push_str(&format!("USD Amount: {}\n", self.usd_amount));
        out
    }

    /// Read commands from stdin until EOF or `quit`, re-rendering after every change.
    pub async fn run_stdio(mut self, mut events: UnboundedReceiver<ExplorerEvent>) -> AppResult<()> {
        let mut lines = BufReader::new(io::stdin()).lines();
        let mut writer = BufWriter::new(io::stdout());

        write_out(&mut writer, &format!("{}\n{HELP}\n", self.render())).await?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    let output = match Command::parse(&line) {
                        Ok(command) => {
                            let (keep_going, message) = self.handle_command(command);
                            if !keep_going {
                                break;
                            }
                            message.unwrap_or_else(|| self.render())
                        }
                        Err(message) => message,
                    };
                    write_out(&mut writer, &format!("{output}\n")).await?;
                }
                Some(event) = events.recv() => {
                    debug!(?event, "fetch completed");
                    self.handle_event(event);
                    write_out(&mut writer, &format!("{}\n", self.render())).await?;
                }
            }
        }

        info!("explorer closed");
        Ok(())
    }

    /// Switching selectors starts from a clean slate, like opening a fresh view.
    fn set_mode(&mut self, advanced: bool) {
        self.advanced = advanced;
        self.selection.clear();
        self.usd_amount.clear();
        self.sync_queries();

        if advanced {
            self.dynamic = DynamicTokenSelector::new();
            self.spawn_tokens_fetch(None);
        }
    }

    fn sync_queries(&mut self) {
        for slot in [Slot::Source, Slot::Target] {
            let token = self.selection.get(slot);
            let chain_id = token.map(|t| t.chain_id.as_str());
            let symbol = token.map(|t| t.symbol.as_str());
            let query = match slot {
                Slot::Source => &mut self.source,
                Slot::Target => &mut self.target,
            };
            if let Some(ticket) = query.set_inputs(chain_id, symbol) {
                self.spawn_price_fetch(slot, ticket);
            }
        }
    }

    fn spawn_price_fetch(&self, slot: Slot, ticket: FetchTicket) {
        let api = self.api.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = ticket.fetch(api.as_ref()).await;
            let _ = events.send(ExplorerEvent::Price {
                slot,
                ticket,
                result,
            });
        });
    }

    fn spawn_tokens_fetch(&self, chain_id: Option<String>) {
        let api = self.api.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let event = match chain_id {
                None => ExplorerEvent::InitialTokens(api.tokens(None).await),
                Some(chain_id) => {
                    let result = api.tokens(Some(&chain_id)).await;
                    ExplorerEvent::Tokens { chain_id, result }
                }
            };
            let _ = events.send(event);
        });
    }
}

async fn write_out<W>(writer: &mut BufWriter<W>, text: &str) -> AppResult<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    writer.write_all(text.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
