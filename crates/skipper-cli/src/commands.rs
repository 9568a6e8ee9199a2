//! CLI command implementations.
//!
//! Every command loads the ledger snapshot named by the config, acts on it
//! as one or more top-level sends, and writes the snapshot back.

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use skipper_contracts::Vote;
use skipper_runtime::{Deployment, Ledger, Outcome};
use skipper_types::{Address, Coins};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{CliConfig, DEFAULT_CONFIG_FILE};
use crate::output::*;

/// Name under which the deployment admin is recorded in the ledger.
const ADMIN: &str = "admin";

/// Main CLI.
#[derive(Parser, Debug)]
#[command(name = "skipper")]
#[command(about = "Skipper - token-weighted governance on a local ledger")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Ledger snapshot (overrides `state_file` from the config)
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    /// Log filter (overrides `logging.level`)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit JSON logs
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Deploy token master, registry and treasury
    Deploy {
        /// Admin account name
        #[arg(long, default_value = "deployer")]
        admin: String,
        /// Token content identifier
        #[arg(long, default_value_t = 0)]
        content_id: u64,
    },

    /// Mint tokens to an account
    Mint {
        to: String,
        /// Amount in tokens (up to 9 decimals)
        amount: String,
    },

    /// Deposit tokens into the owner's vault, deploying it if needed
    Deposit {
        owner: String,
        /// Amount in tokens (up to 9 decimals)
        amount: String,
    },

    /// Extend the vault lock
    Lock {
        owner: String,
        /// Lock period in seconds
        period: u64,
    },

    /// Withdraw everything from the vault once the lock expired
    Unlock { owner: String },

    /// Create a proposal through the owner's vault
    Propose {
        owner: String,
        id: u64,
        /// Receiver of the executed payload (defaults to the treasury)
        #[arg(long)]
        receiver: Option<String>,
        /// Payload body (hex)
        #[arg(long, default_value = "")]
        body: String,
        /// Lock period in seconds
        #[arg(long)]
        lock_period: Option<u64>,
    },

    /// Vote on a proposal through the owner's vault
    Vote {
        owner: String,
        id: u64,
        #[arg(value_enum)]
        vote: VoteArg,
        /// Lock period in seconds
        #[arg(long)]
        lock_period: Option<u64>,
    },

    /// Execute a proposal that reached quorum
    Execute { executor: String, id: u64 },

    /// Move the ledger clock forward
    Advance { seconds: u64 },

    /// Native and token balance of an account
    Balance { account: String },

    /// Show actor state
    Show {
        /// Print the encoded state size instead of the state
        #[arg(long)]
        size: bool,
        #[command(subcommand)]
        target: ShowTarget,
    },

    /// Compute actor addresses
    #[command(subcommand)]
    Address(AddressTarget),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteArg {
    Yes,
    No,
}

impl From<VoteArg> for Vote {
    fn from(vote: VoteArg) -> Self {
        match vote {
            VoteArg::Yes => Vote::Yes,
            VoteArg::No => Vote::No,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ShowTarget {
    Vault { owner: String },
    Proposal { id: u64 },
    Ballot { id: u64, owner: String },
    Treasury,
}

#[derive(Subcommand, Debug)]
pub enum AddressTarget {
    Vault { owner: String },
    Proposal { id: u64 },
    Ballot { id: u64, owner: String },
}

/// The ledger snapshot a command works on.
struct Session {
    ledger: Ledger,
    state_file: PathBuf,
}

impl Session {
    fn open(config: &CliConfig) -> anyhow::Result<Self> {
        let state_file = config.state_file.clone();
        let ledger = if state_file.exists() {
            Ledger::load(&state_file)
                .map_err(|e| anyhow::anyhow!("Failed to load ledger '{}': {}", state_file.display(), e))?
        } else {
            info!(path = %state_file.display(), "Starting a new ledger");
            Ledger::new(config.protocol.clone())?
        };
        Ok(Self { ledger, state_file })
    }

    fn save(&self) -> anyhow::Result<()> {
        self.ledger
            .save(&self.state_file)
            .map_err(|e| anyhow::anyhow!("Failed to save ledger '{}': {}", self.state_file.display(), e))
    }

    fn deployment(&self) -> anyhow::Result<Deployment> {
        self.ledger
            .named(ADMIN)
            .and_then(|admin| Deployment::from_ledger(&self.ledger, admin))
            .ok_or_else(|| anyhow::anyhow!("No governance deployed yet; run `skipper deploy` first"))
    }

    /// Resolve an account, creating a funded user for unknown names.
    fn account(&mut self, name: &str) -> anyhow::Result<Address> {
        match parse_address(name)? {
            Some(address) => Ok(address),
            None => Ok(self.ledger.user(name)),
        }
    }

    /// Resolve an account without touching the ledger.
    fn lookup(&self, name: &str) -> anyhow::Result<Address> {
        match parse_address(name)? {
            Some(address) => Ok(address),
            None => Ok(self.ledger.named(name).unwrap_or_else(|| Address::from_seed(name))),
        }
    }

    fn labels(&self) -> BTreeMap<Address, String> {
        let mut labels = BTreeMap::new();
        for (name, address) in self.ledger.names() {
            labels.entry(address).or_insert_with(|| name.to_string());
        }
        labels
    }

    fn report(&self, title: &str, outcome: &Outcome) {
        let labels = self.labels();
        print_outcome(title, outcome, &|a: &Address| labels.get(a).cloned());
    }
}

fn parse_address(s: &str) -> anyhow::Result<Option<Address>> {
    if s.starts_with("skip1") || s.starts_with("0x") {
        let address = s
            .parse::<Address>()
            .map_err(|e| anyhow::anyhow!("Invalid address '{}': {}", s, e))?;
        Ok(Some(address))
    } else {
        Ok(None)
    }
}

fn parse_amount(s: &str) -> anyhow::Result<Coins> {
    Coins::parse_decimal(s).map_err(|e| anyhow::anyhow!("Invalid amount '{}': {}", s, e))
}

/// Run one command against the configured ledger.
pub fn execute(command: Commands, config: &CliConfig, config_path: &Path) -> anyhow::Result<()> {
    if let Commands::Init { force } = command {
        return init_config(config_path, force);
    }

    let mut session = Session::open(config)?;
    let dirty = run(command, &mut session)?;
    if dirty {
        session.save()?;
    }
    Ok(())
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("'{}' already exists (use --force to overwrite)", path.display());
    }
    CliConfig::default().to_file(path)?;
    print_success(&format!("Wrote {}", path.display()));
    Ok(())
}

/// Returns whether the ledger changed.
fn run(command: Commands, session: &mut Session) -> anyhow::Result<bool> {
    match command {
        Commands::Init { .. } => Ok(false),
        Commands::Deploy { admin, content_id } => {
            if session.deployment().is_ok() {
                anyhow::bail!("Governance is already deployed in this ledger");
            }
            let admin = session.account(&admin)?;
            let deployment = Deployment::deploy(&mut session.ledger, admin, content_id)?;
            session.ledger.set_name(ADMIN, admin);
            info!(%admin, registry = %deployment.registry, "Deployed");

            print_success("Governance deployed");
            println!("Token master: {}", deployment.master.to_string().bright_cyan());
            println!("Registry:     {}", deployment.registry.to_string().bright_cyan());
            println!("Treasury:     {}", deployment.treasury.to_string().bright_cyan());
            Ok(true)
        }
        Commands::Mint { to, amount } => {
            let gov = session.deployment()?;
            let to = session.account(&to)?;
            let amount = parse_amount(&amount)?;
            let outcome = gov.mint(&mut session.ledger, to, amount)?;
            session.report("Mint", &outcome);
            Ok(true)
        }
        Commands::Deposit { owner, amount } => {
            let gov = session.deployment()?;
            let owner = session.account(&owner)?;
            let amount = parse_amount(&amount)?;
            if !session.ledger.is_deployed(gov.vault_of(owner)) {
                let outcome = gov.deploy_vault(&mut session.ledger, owner)?;
                session.report("Deploy vault", &outcome);
            }
            let outcome = gov.deposit(&mut session.ledger, owner, amount)?;
            session.report("Deposit", &outcome);
            Ok(true)
        }
        Commands::Lock { owner, period } => {
            let gov = session.deployment()?;
            let owner = session.account(&owner)?;
            let outcome = gov.lock(&mut session.ledger, owner, period)?;
            session.report("Lock", &outcome);
            Ok(true)
        }
        Commands::Unlock { owner } => {
            let gov = session.deployment()?;
            let owner = session.account(&owner)?;
            let outcome = gov.unlock(&mut session.ledger, owner)?;
            session.report("Unlock", &outcome);
            Ok(true)
        }
        Commands::Propose {
            owner,
            id,
            receiver,
            body,
            lock_period,
        } => {
            let gov = session.deployment()?;
            let owner = session.account(&owner)?;
            let receiver = match receiver {
                Some(receiver) => session.lookup(&receiver)?,
                None => gov.treasury,
            };
            let body = hex::decode(body.trim_start_matches("0x"))
                .map_err(|e| anyhow::anyhow!("Invalid body hex: {}", e))?;
            let outcome = gov.propose(&mut session.ledger, owner, id, receiver, body, lock_period)?;
            session.report(&format!("Propose #{}", id), &outcome);
            Ok(true)
        }
        Commands::Vote {
            owner,
            id,
            vote,
            lock_period,
        } => {
            let gov = session.deployment()?;
            let owner = session.account(&owner)?;
            let outcome = gov.vote(&mut session.ledger, owner, id, vote.into(), lock_period)?;
            session.report(&format!("Vote on #{}", id), &outcome);
            Ok(true)
        }
        Commands::Execute { executor, id } => {
            let gov = session.deployment()?;
            let executor = session.account(&executor)?;
            let outcome = gov.execute(&mut session.ledger, executor, id)?;
            session.report(&format!("Execute #{}", id), &outcome);
            Ok(true)
        }
        Commands::Advance { seconds } => {
            let now = session.ledger.advance(seconds);
            print_info(&format!("Ledger time is now {}", now));
            Ok(true)
        }
        Commands::Balance { account } => {
            let address = session.lookup(&account)?;
            println!("Address: {}", address.to_string().bright_cyan());
            println!("Native:  {}", format_coins(&session.ledger.balance(address)).bright_yellow());
            if let Ok(gov) = session.deployment() {
                let tokens = session.ledger.token_balance(gov.master, address);
                println!("Tokens:  {}", format_coins(&tokens).bright_yellow());
            }
            Ok(false)
        }
        Commands::Show { size, target } => {
            show(session, size, target)?;
            Ok(false)
        }
        Commands::Address(target) => {
            let gov = session.deployment()?;
            let address = match target {
                AddressTarget::Vault { owner } => gov.vault_of(session.lookup(&owner)?),
                AddressTarget::Proposal { id } => gov.proposal(id),
                AddressTarget::Ballot { id, owner } => gov.ballot(id, session.lookup(&owner)?),
            };
            println!("{}", address);
            Ok(false)
        }
    }
}

fn show(session: &Session, size: bool, target: ShowTarget) -> anyhow::Result<()> {
    let gov = session.deployment()?;
    let ledger = &session.ledger;
    let (title, address) = match &target {
        ShowTarget::Vault { owner } => ("Vault", gov.vault_of(session.lookup(owner)?)),
        ShowTarget::Proposal { id } => ("Proposal", gov.proposal(*id)),
        ShowTarget::Ballot { id, owner } => ("Ballot", gov.ballot(*id, session.lookup(owner)?)),
        ShowTarget::Treasury => ("Treasury", gov.treasury),
    };

    if size {
        let bytes = ledger.state_size(address)?;
        println!("{} {}: {} bytes", title, address, bytes.to_string().bright_green());
        return Ok(());
    }

    let title = format!("{} {}", title, address);
    match target {
        ShowTarget::Vault { .. } => print_state(&title, &ledger.vault_data(address)?),
        ShowTarget::Proposal { .. } => print_state(&title, &ledger.proposal_data(address)?),
        ShowTarget::Ballot { .. } => print_state(&title, &ledger.ballot_data(address)?),
        ShowTarget::Treasury => print_state(&title, &ledger.treasury_data(address)?),
    }
}
