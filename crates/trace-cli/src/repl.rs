//! Line-oriented driver: one command or chat message per line.

use anyhow::Result;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use trace_core::{
    AnalysisState, App, ChatController, CoreError, LoginForm, RegisterForm, SendOutcome,
};
use trace_persist::CredentialStore;
use trace_types::{ChatThread, MessageStatus, NavAction, Screen, Sender, ThreadId};

const HELP: &str = "\
/login <username> <password>           sign in
/register <name> <email> <password> [language]  create an account
/logout                                sign out
/chat                                  open your chats
/new                                   start a new chat
/threads                               list chats
/select <n>                            switch to chat n
/delete <n>                            delete chat n
/analysis                              analyze recent entries (again to retry)
/burn <text>                           write something and let it go
/home                                  back to the home screen
/quit                                  exit
Anything else on the chat screen is sent as a message.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login {
        username: String,
        password: String,
    },
    Register {
        name: String,
        email: String,
        password: String,
        language: Option<String>,
    },
    Logout,
    Chat,
    New,
    Threads,
    Select(usize),
    Delete(usize),
    Analysis,
    Burn(String),
    Home,
    Help,
    Quit,
    Message(String),
}

impl Command {
    pub fn parse(line: &str) -> std::result::Result<Command, String> {
        let line = line.trim();
        if !line.starts_with('/') {
            return Ok(Command::Message(line.to_string()));
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        match name {
            "/login" => match args.as_slice() {
                [username, password] => Ok(Command::Login {
                    username: username.to_string(),
                    password: password.to_string(),
                }),
                _ => Err("usage: /login <username> <password>".to_string()),
            },
            "/register" => match args.as_slice() {
                [name, email, password] => Ok(Command::Register {
                    name: name.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                    language: None,
                }),
                [name, email, password, language] => Ok(Command::Register {
                    name: name.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                    language: Some(language.to_string()),
                }),
                _ => Err("usage: /register <name> <email> <password> [language]".to_string()),
            },
            "/logout" => Ok(Command::Logout),
            "/chat" => Ok(Command::Chat),
            "/new" => Ok(Command::New),
            "/threads" => Ok(Command::Threads),
            "/select" => parse_index(&args).map(Command::Select),
            "/delete" => parse_index(&args).map(Command::Delete),
            "/analysis" => Ok(Command::Analysis),
            "/burn" => Ok(Command::Burn(rest.to_string())),
            "/home" => Ok(Command::Home),
            "/help" => Ok(Command::Help),
            "/quit" | "/exit" => Ok(Command::Quit),
            other => Err(format!("unknown command {}; try /help", other)),
        }
    }
}

fn parse_index(args: &[&str]) -> std::result::Result<usize, String> {
    match args {
        [n] => n
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("not a chat number: {}", n)),
        _ => Err("expected a chat number".to_string()),
    }
}

/// Read commands from stdin until EOF or /quit
pub async fn run<S: CredentialStore>(app: &mut App<S>) -> Result<()> {
    greet(app);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match Command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => {
                if let Err(e) = execute(app, command).await {
                    println!("! {}", describe(&e));
                }
            }
            Err(usage) => println!("{}", usage),
        }
    }
    Ok(())
}

fn greet<S: CredentialStore>(app: &App<S>) {
    match app.user() {
        Some(user) => println!("Welcome back, {}.", user.display_name()),
        None => println!("Welcome to Trace. /login or /register to begin."),
    }
    println!("Type /help for commands.");
}

pub async fn execute<S: CredentialStore>(app: &mut App<S>, command: Command) -> trace_core::Result<()> {
    match command {
        Command::Login { username, password } => {
            app.navigate(NavAction::ShowLogin);
            let user = app.login(&LoginForm::new(username, password)).await?;
            println!("Signed in as {}.", user.display_name());
        }
        Command::Register {
            name,
            email,
            password,
            language,
        } => {
            app.navigate(NavAction::ShowRegister);
            let mut form = RegisterForm::new(name, email, password);
            if let Some(language) = language {
                form = form.with_language(language);
            }
            let user = app.register(&form).await?;
            println!("Welcome, {}.", user.display_name());
        }
        Command::Logout => {
            app.logout()?;
            println!("Signed out.");
        }
        Command::Chat => {
            let chat = app.open_chat().await?;
            print_threads(chat);
            if let Some(thread) = chat.current() {
                print_messages(&thread);
            }
        }
        Command::New => {
            let chat = chat_view(app).await?;
            let id = chat.create_thread().await;
            if let Some(thread) = chat.thread(id) {
                print_messages(&thread);
            }
        }
        Command::Threads => print_threads(chat_view(app).await?),
        Command::Select(n) => {
            let threads = chat_view(app).await?.threads();
            let id = match thread_at(&threads, n) {
                Ok(id) => id,
                Err(usage) => {
                    println!("{}", usage);
                    return Ok(());
                }
            };
            app.open_thread(id).await?;
            if let Some(thread) = app.chat().and_then(|chat| chat.thread(id)) {
                print_messages(&thread);
            }
        }
        Command::Delete(n) => {
            let chat = chat_view(app).await?;
            let id = match thread_at(&chat.threads(), n) {
                Ok(id) => id,
                Err(usage) => {
                    println!("{}", usage);
                    return Ok(());
                }
            };
            chat.delete_thread(id).await?;
            println!("Deleted.");
            print_threads(chat);
        }
        Command::Analysis => {
            // Again on the analysis screen means retry
            let retry = app.screen() == Screen::Analysis && app.analysis().is_some();
            let state = if retry {
                match app.analysis() {
                    Some(requestor) => requestor.fetch().await,
                    None => return Ok(()),
                }
            } else {
                app.open_analysis().await?
            };
            print_analysis(&state);
        }
        Command::Burn(text) => {
            if app.screen() != Screen::Burn || app.burn().is_none() {
                app.open_burn()?;
            }
            let Some(journal) = app.burn() else {
                return Ok(());
            };
            journal.set_input(text);
            if journal.burn() {
                println!("Burning...");
                journal.settled().await;
                println!("Gone. Nothing was saved.");
            } else {
                println!("Write something first.");
            }
        }
        Command::Home => {
            app.navigate(NavAction::BackToHome);
            println!("Home.");
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
        Command::Message(text) => {
            let Some(chat) = app.chat().filter(|_| app.screen() == Screen::Chat) else {
                println!("Open your chats with /chat first.");
                return Ok(());
            };
            let Some(id) = chat.selected() else {
                return Ok(());
            };
            match chat.send_message(id, &text).await {
                SendOutcome::Skipped(reason) => println!("Not sent: {}.", reason),
                SendOutcome::Delivered | SendOutcome::Failed => {
                    if let Some(reply) = chat
                        .thread(id)
                        .and_then(|t| t.messages.last().cloned())
                    {
                        println!("Trace: {}", reply.text);
                    }
                }
            }
        }
    }
    Ok(())
}

/// The open chat view, opening it first when another screen is showing
async fn chat_view<S: CredentialStore>(app: &mut App<S>) -> trace_core::Result<&ChatController> {
    if app.screen() != Screen::Chat || app.chat().is_none() {
        app.open_chat().await?;
    }
    app.chat().ok_or(CoreError::NotAuthenticated)
}

/// Thread at 1-based list position `n`
fn thread_at(threads: &[ChatThread], n: usize) -> std::result::Result<ThreadId, String> {
    n.checked_sub(1)
        .and_then(|i| threads.get(i))
        .map(|t| t.id)
        .ok_or_else(|| format!("no chat {}; /threads lists them", n))
}

fn print_threads(chat: &ChatController) {
    let now = Utc::now();
    let selected = chat.selected();
    for (i, thread) in chat.threads().iter().enumerate() {
        let marker = if Some(thread.id) == selected { '*' } else { ' ' };
        println!(
            "{} {:>2}. {} ({})",
            marker,
            i + 1,
            thread.title,
            thread.relative_age(now)
        );
    }
}

fn print_messages(thread: &ChatThread) {
    println!("-- {} --", thread.title);
    for message in &thread.messages {
        let who = match message.sender {
            Sender::User => "You",
            Sender::Assistant => "Trace",
        };
        match message.status {
            MessageStatus::Pending => println!("{}: ...", who),
            _ => println!("{}: {}", who, message.text),
        }
    }
}

fn print_analysis(state: &AnalysisState) {
    if let Some(error) = &state.error {
        println!("! {}", error);
        println!("Run /analysis again to retry.");
        return;
    }
    match &state.result {
        Some(result) if !result.is_empty() => {
            println!(
                "{} entries over the last {} days ({})",
                result.entry_count, result.analysis_period_days, result.timestamp
            );
            println!();
            println!("{}", result.insights);
        }
        _ => println!("Nothing to analyze yet. Write a few entries first."),
    }
}

fn describe(error: &CoreError) -> String {
    match error {
        CoreError::Validation(errors) => errors
            .iter()
            .map(|(_, message)| message)
            .collect::<Vec<_>>()
            .join("\n! "),
        other => other.to_string(),
    }
}
