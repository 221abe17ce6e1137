use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;

use crate::backend::{Role, SharedBackend, UploadFile};
use crate::core::AppConfig;
use crate::orchestrator::{
    ConversationOrchestrator, Notice, SkipReason, SubmitOutcome, UploadOrchestrator,
    UploadOutcome,
};
use crate::session::{Message, Session};

const EXCERPT_CHARS: usize = 120;

#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Upload(PathBuf),
    Open(String),
    Documents,
    Clear,
    Help,
    Quit,
    Say(String),
}

impl ReplCommand {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Some(ReplCommand::Say(line.to_string()));
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match (name, arg) {
            ("upload", path) if !path.is_empty() => Some(ReplCommand::Upload(PathBuf::from(path))),
            ("open", id) if !id.is_empty() => Some(ReplCommand::Open(id.to_string())),
            ("documents", _) => Some(ReplCommand::Documents),
            ("clear", _) => Some(ReplCommand::Clear),
            ("help", _) => Some(ReplCommand::Help),
            ("quit" | "exit", _) => Some(ReplCommand::Quit),
            _ => None,
        }
    }
}

const HELP: &str = "\
/upload PATH   upload a PDF or TXT file and start a new conversation
/open ID       switch to a previously uploaded document
/documents     list uploaded documents
/clear         start over with the current document
/quit          exit
Anything else is sent as a question about the current document.";

fn excerpt(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= EXCERPT_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", cut)
}

fn render_message(msg: &Message) -> String {
    let mut out = match msg.role() {
        Role::User => format!("you: {}", msg.content()),
        Role::Assistant => msg.content().to_string(),
    };
    for (i, source) in msg.sources().iter().enumerate() {
        out.push_str(&format!(
            "\n  [{}] {} ({}): {}",
            i + 1,
            source.id,
            source.relevance,
            excerpt(&source.text)
        ));
    }
    out
}

struct Repl {
    session: Session,
    backend: SharedBackend,
    uploads: UploadOrchestrator,
    conversation: ConversationOrchestrator,
    notices: mpsc::UnboundedReceiver<Notice>,
    ready_delay: Duration,
}

impl Repl {
    fn new(config: &AppConfig, backend: SharedBackend) -> Self {
        let session = Session::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let uploads = UploadOrchestrator::new(session.clone(), backend.clone())
            .ready_delay(config.ready_delay)
            .notify(tx);
        let conversation = ConversationOrchestrator::new(session.clone(), backend.clone());
        Self {
            session,
            backend,
            uploads,
            conversation,
            notices: rx,
            ready_delay: config.ready_delay,
        }
    }

    fn prompt(&self) -> String {
        match self.session.current_document() {
            Some(doc) => format!("{}> ", doc.file_name),
            None => ">>> ".to_string(),
        }
    }

    async fn wait_until_ready(&mut self) {
        // Give up after a generous margin so a dropped notice can't hang
        // the prompt
        let limit = self.ready_delay + Duration::from_secs(5);
        if let Ok(Some(Notice::ReadyToConverse)) =
            tokio::time::timeout(limit, self.notices.recv()).await
        {
            println!("Ready. Ask a question about the document.");
        }
    }

    async fn upload(&mut self, path: &Path) -> Result<()> {
        let file = match UploadFile::from_path(path).await {
            Ok(file) => file,
            Err(err) => {
                println!("Could not open {}: {}", path.display(), err);
                return Ok(());
            }
        };
        println!("Processing {}...", file.file_name);
        match self.uploads.submit_upload(file).await {
            UploadOutcome::Succeeded(doc) => {
                println!("Uploaded {} ({})", doc.file_name, doc.id);
                self.wait_until_ready().await;
            }
            UploadOutcome::Rejected(err) => println!("{}", err),
            UploadOutcome::Failed(message) => println!("{}", message),
            UploadOutcome::Ignored => println!("Busy, try again in a moment."),
        }
        Ok(())
    }

    async fn open(&mut self, id: &str) {
        match self.uploads.open_document(id).await {
            Ok(Some(doc)) => {
                println!("Opened {} ({})", doc.file_name, doc.id);
                self.wait_until_ready().await;
            }
            Ok(None) => println!("Busy, try again in a moment."),
            Err(err) => println!("Could not open {}: {}", id, err),
        }
    }

    async fn documents(&self) {
        match self.backend.list_documents().await {
            Ok(docs) if docs.is_empty() => println!("No documents uploaded yet."),
            Ok(docs) => {
                for doc in docs {
                    println!("{}  {}", doc.id, doc.file_name);
                }
            }
            Err(err) => println!("Could not list documents: {}", err),
        }
    }

    async fn say(&self, text: &str) {
        match self.conversation.submit_message(text).await {
            SubmitOutcome::Answered | SubmitOutcome::FellBack => {
                if let Some(reply) = self.session.snapshot().conversation.messages().last() {
                    println!("{}", render_message(reply));
                }
            }
            SubmitOutcome::Ignored(SkipReason::NoDocument) => {
                println!("No document selected. Use /upload PATH or /open ID first.")
            }
            SubmitOutcome::Ignored(SkipReason::Busy) => println!("Still working on the last request."),
            SubmitOutcome::Ignored(SkipReason::EmptyMessage) => {}
        }
    }
}

pub async fn run(
    config: &AppConfig,
    backend: SharedBackend,
    file: Option<PathBuf>,
    document: Option<String>,
) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut repl = Repl::new(config, backend);

    if let Some(path) = file {
        repl.upload(&path).await?;
    } else if let Some(id) = document {
        repl.open(&id).await;
    } else {
        println!("{}", HELP);
    }

    loop {
        let readline = rl.readline(&repl.prompt());
        match readline {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }
                match ReplCommand::parse(&line) {
                    Some(ReplCommand::Upload(path)) => repl.upload(&path).await?,
                    Some(ReplCommand::Open(id)) => repl.open(&id).await,
                    Some(ReplCommand::Documents) => repl.documents().await,
                    Some(ReplCommand::Clear) => {
                        if repl.conversation.reset() {
                            println!("Conversation cleared.");
                        }
                    }
                    Some(ReplCommand::Help) => println!("{}", HELP),
                    Some(ReplCommand::Quit) => break,
                    Some(ReplCommand::Say(text)) => repl.say(&text).await,
                    None => println!("Unknown command. Type /help for a list."),
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}
