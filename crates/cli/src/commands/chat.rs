//! Local conversation driver: one line of input per chat message, replies printed
//! with the quick-reply menu the user would see.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use loja_bot::{ConversationService, EventContext};
use loja_core::catalog::Catalog;
use loja_core::config::AppConfig;
use loja_core::domain::session::UserId;
use loja_core::flows::{FlowEngine, MenuChange, Reply};
use loja_db::{
    connect, migrations, InMemorySessionRepository, SessionRepository, SqlSessionRepository,
};

use crate::commands::{current_thread_runtime, load_config, CommandResult};

#[derive(Clone, Debug)]
pub struct ChatOptions {
    pub user_id: String,
    pub first_name: Option<String>,
    /// Keep sessions in memory instead of the configured database.
    pub memory: bool,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self { user_id: "local".to_string(), first_name: None, memory: false }
    }
}

pub fn run(options: ChatOptions) -> CommandResult {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    run_with_io(options, stdin.lock(), &mut stdout)
}

pub fn run_with_io<R, W>(options: ChatOptions, input: R, output: &mut W) -> CommandResult
where
    R: BufRead,
    W: Write,
{
    let config = match load_config("chat") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let catalog = match Catalog::load_or_builtin(config.catalog.path.as_deref()) {
        Ok(catalog) => catalog,
        Err(error) => return CommandResult::failure("chat", "catalog_load", error.to_string(), 6),
    };
    let runtime = match current_thread_runtime("chat") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let engine = FlowEngine::new(Arc::new(catalog));
    let result = runtime.block_on(async {
        let sessions = open_sessions(&config, options.memory).await?;
        converse_lines(ConversationService::new(engine, sessions), &options, input, output).await
    });

    match result {
        Ok(count) => CommandResult::success(
            "chat",
            format!("chat session for user `{}` ended after {count} messages", options.user_id),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("chat", error_class, message, exit_code)
        }
    }
}

type ChatFailure = (&'static str, String, u8);

async fn open_sessions(
    config: &AppConfig,
    memory: bool,
) -> Result<Arc<dyn SessionRepository>, ChatFailure> {
    if memory {
        return Ok(Arc::new(InMemorySessionRepository::default()));
    }

    let pool = connect(&config.database)
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
    migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 5u8))?;
    Ok(Arc::new(SqlSessionRepository::new(pool)))
}

async fn converse_lines<R, W>(
    service: ConversationService<dyn SessionRepository>,
    options: &ChatOptions,
    input: R,
    output: &mut W,
) -> Result<usize, ChatFailure>
where
    R: BufRead,
    W: Write,
{
    let user_id = UserId(options.user_id.clone());
    let mut count = 0;

    for line in input.lines() {
        let line = line.map_err(|error| ("io", error.to_string(), 7u8))?;
        if line.trim().is_empty() {
            continue;
        }
        count += 1;

        let ctx = EventContext { correlation_id: format!("chat-{count}") };
        let replies = match service
            .converse(&user_id, &line, options.first_name.as_deref(), &ctx)
            .await
        {
            Ok(turn) => turn.replies,
            Err(error) => {
                let interface = error.into_interface(ctx.correlation_id.clone());
                vec![Reply::text(interface.user_message())]
            }
        };

        for reply in &replies {
            write_reply(output, reply).map_err(|error| ("io", error.to_string(), 7u8))?;
        }
    }

    Ok(count)
}

fn write_reply<W: Write>(output: &mut W, reply: &Reply) -> io::Result<()> {
    writeln!(output, "{}", reply.text)?;
    match &reply.menu {
        MenuChange::Keep => {}
        MenuChange::Show(menu) => {
            for row in &menu.rows {
                let buttons: Vec<String> = row.iter().map(|label| format!("[{label}]")).collect();
                writeln!(output, "  {}", buttons.join(" "))?;
            }
        }
        MenuChange::Hide => writeln!(output, "  (menu oculto)")?,
    }
    writeln!(output)
}
