use chronicle_gm::{
    ChatSession, ControlMarker, ParsedReply, PersonaId, ProtocolVersion, Settings, TemplateLibrary,
    ai, create_session, logging, parse_reply, persona, personas, quick_start, settings, templates,
};
use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use std::io::Write as _;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

#[derive(Debug, Parser)]
#[command(version, about = "Play a solo campaign with an AI Game Master")]
struct Cli {
    /// Game Master persona.
    #[arg(long, default_value = "purist")]
    persona: PersonaId,

    /// Out-of-character protocol version (2.0 or 3.0).
    #[arg(long, default_value = "3.0")]
    protocol: String,

    /// Session password for out-of-character requests. Asked for if omitted.
    #[arg(long)]
    password: Option<String>,

    /// Model to use instead of the one in the settings.
    #[arg(long)]
    model: Option<String>,

    /// Start playing right away, without the setup conversation.
    #[arg(long)]
    skip_setup: bool,

    /// Print replies as they arrive instead of waiting for the full text.
    #[arg(long)]
    stream: bool,

    /// List personas and exit.
    #[arg(long)]
    list_personas: bool,
}

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let (settings, load_error) = Settings::load_or_default();
    if let Err(e) = logging::init(settings.debug_mode) {
        eprintln!("Logging disabled: {e}");
    }
    if let Some(e) = load_error {
        log::warn!("Could not read settings, using defaults: {e}");
        eprintln!("Warning: could not read settings ({e}), using defaults.");
    }
    if let Some(dir) = &settings.templates_dir {
        templates::install(TemplateLibrary::from_dir(dir)?);
    }
    settings::replace(settings);

    if cli.list_personas {
        for persona in personas() {
            println!("{:<12} {:<16} {}", persona.id, persona.name, persona.description);
        }
        return Ok(());
    }

    let version = ProtocolVersion::from_tag(&cli.protocol);
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let password = match cli.password.clone() {
        Some(password) => password,
        None => prompt(&mut input, "Session password: ")
            .await?
            .ok_or_else(|| eyre!("A session password is required"))?,
    };
    log::info!(
        "Starting campaign: persona {}, protocol {version}",
        cli.persona
    );

    let mut history = Vec::new();
    if !cli.skip_setup {
        let instruction = templates::setup_instruction(version);
        let mut setup = create_session(Vec::new(), &instruction, cli.model.as_deref());
        match run_setup(&mut setup, &mut input, &cli).await? {
            Some(title) => println!("\n=== {title} ===\n"),
            None => return Ok(()),
        }
        history = setup.into_history();
    }

    let persona = persona::find(cli.persona);
    let instruction = persona.instruction(&password, version);
    let mut chat = create_session(history, &instruction, cli.model.as_deref());
    println!("{} takes the Game Master's chair. Type /quit to leave.", persona.name);

    let mut next = if cli.skip_setup {
        Some("Begin the adventure.".to_string())
    } else {
        prompt(&mut input, "> ").await?
    };
    while let Some(line) = next {
        match Command::parse(&line) {
            Command::Empty => {}
            Command::Quit => break,
            Command::ResetKey(key) => {
                reset_key(key);
                chat = rebuild(&chat, &cli);
                println!("API key updated.");
            }
            Command::Say(text) => {
                if let Some(reply) = exchange(&mut chat, text, &cli).await {
                    show(&reply);
                }
            }
        }
        next = prompt(&mut input, "> ").await?;
    }

    Ok(())
}

/// A line of player input.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Empty,
    Quit,
    ResetKey(&'a str),
    Say(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        if line == "/quit" {
            return Command::Quit;
        }
        match line.strip_prefix("/reset-key") {
            Some(key) if key.is_empty() || key.starts_with(char::is_whitespace) => {
                Command::ResetKey(key.trim())
            }
            _ => Command::Say(line),
        }
    }
}

// Returns the campaign title, or None if the player left during setup.
async fn run_setup(
    setup: &mut ChatSession,
    input: &mut Input,
    cli: &Cli,
) -> Result<Option<String>> {
    let mut pending = Some(format!(
        "Hello! I'd like to start a new campaign. Please narrate in {}.",
        settings::current().language
    ));
    loop {
        let line = match pending.take() {
            Some(line) => line,
            None => match prompt(input, "> ").await? {
                Some(line) => line,
                None => return Ok(None),
            },
        };

        match Command::parse(&line) {
            Command::Empty => {}
            Command::Quit => return Ok(None),
            Command::ResetKey(key) => {
                reset_key(key);
                *setup = rebuild(setup, cli);
                println!("API key updated.");
            }
            Command::Say(text) => {
                let Some(reply) = exchange(setup, text, cli).await else {
                    continue;
                };
                show(&reply);

                if reply.has_marker(ControlMarker::SetupComplete) {
                    return Ok(Some(reply.title.unwrap_or_else(|| "Untitled".to_string())));
                }
                if reply.has_marker(ControlMarker::GenerateQuickStart) {
                    pending = pick_quick_start(input, cli).await?;
                }
            }
        }
    }
}

// The old session still holds the previous client.
fn rebuild(chat: &ChatSession, cli: &Cli) -> ChatSession {
    create_session(
        chat.history().to_vec(),
        &chat.config().system_instruction,
        cli.model.as_deref(),
    )
}

async fn pick_quick_start(input: &mut Input, cli: &Cli) -> Result<Option<String>> {
    let instruction = templates::quick_start_instruction();
    let mut generator = create_session(Vec::new(), &instruction, cli.model.as_deref());
    let raw = match generator.send_message("Generate the characters.").await {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Could not generate characters: {e}");
            return Ok(None);
        }
    };
    let batch = match quick_start::parse_quick_start_batch(&raw) {
        Ok(batch) if !batch.is_empty() => batch,
        Ok(_) => return Ok(None),
        Err(e) => {
            log::error!("Unparseable quick start batch: {e}\n{raw}");
            eprintln!("The generated characters were malformed.");
            return Ok(None);
        }
    };

    for (index, character) in batch.iter().enumerate() {
        println!("{}. {} - {}\n   {}", index + 1, character.name, character.concept, character.hook);
    }
    loop {
        let Some(line) = prompt(input, "Pick a character: ").await? else {
            return Ok(None);
        };
        match line.trim().parse::<usize>() {
            Ok(n) if (1..=batch.len()).contains(&n) => {
                let chosen = serde_json::to_string_pretty(&batch[n - 1])?;
                return Ok(Some(format!("I choose this character:\n{chosen}")));
            }
            _ => println!("Enter a number between 1 and {}.", batch.len()),
        }
    }
}

async fn exchange(chat: &mut ChatSession, message: &str, cli: &Cli) -> Option<ParsedReply> {
    let result = if cli.stream {
        let text = chat
            .send_message_stream(message, |chunk| {
                print!("{chunk}");
                let _ = std::io::stdout().flush();
            })
            .await;
        println!();
        text
    } else {
        chat.send_message(message).await
    };

    match result {
        Ok(text) => Some(parse_reply(&text)),
        Err(e) if e.is_auth_error() => {
            eprintln!("The API rejected your key: {e}\nUse /reset-key <key> to set a new one.");
            None
        }
        Err(e) => {
            eprintln!("Request failed: {e}");
            None
        }
    }
}

fn show(reply: &ParsedReply) {
    if !reply.narrative.is_empty() {
        println!("\n{}\n", reply.narrative);
    }
    if let Some(combat) = &reply.combat {
        let line = combat
            .combatants
            .iter()
            .map(|c| format!("{}: {}", c.name, c.status))
            .collect::<Vec<_>>()
            .join(" | ");
        println!("[combat] {line}");
    }
}

fn reset_key(key: &str) {
    let mut settings = settings::current();
    settings.api_key = (!key.is_empty()).then(|| key.to_string());
    if let Err(e) = settings.save() {
        log::error!("Failed to save settings: {e:#?}");
    }
    settings::replace(settings);
    ai::invalidate();
}

async fn prompt(input: &mut Input, label: &str) -> Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(label.as_bytes()).await?;
    stdout.flush().await?;
    Ok(input.next_line().await?)
}
