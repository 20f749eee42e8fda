//! Command dispatch and execution handlers.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result, bail};

use abate_export::ExportRequest;
use abate_session::{Credentials, Registration};

use super::args::*;
use crate::context::AppContext;
use crate::dataset::read_rows;
use crate::styled_output::{print_info, print_success, print_warning};

/// Dispatch a CLI command to its handler.
pub async fn dispatch_command(command: Commands, ctx: &AppContext) -> Result<()> {
    match command {
        Commands::Whoami => run_whoami(ctx).await,
        Commands::Login(args) => run_login(args, ctx).await,
        Commands::Register(args) => run_register(args, ctx).await,
        Commands::Logout => run_logout(ctx).await,
        Commands::Navigate(args) => run_navigate(args, ctx).await,
        Commands::Routes => {
            run_routes(ctx);
            Ok(())
        }
        Commands::Export(export) => run_export(export, ctx).await,
        Commands::Config => show_config(ctx),
    }
}

async fn run_whoami(ctx: &AppContext) -> Result<()> {
    ctx.gate.initialize().await;
    match ctx.gate.session() {
        Some(session) => {
            println!("{}", session.subject_id);
            if !session.active {
                print_warning("Conta inativa");
            }
            print_info(&format!(
                "Sessão desde {}",
                session.created_at.format("%d/%m/%Y %H:%M:%S")
            ));
        }
        None => print_info("Nenhuma sessão ativa"),
    }
    Ok(())
}

async fn run_login(args: LoginArgs, ctx: &AppContext) -> Result<()> {
    let password = read_secret("Senha: ", args.password_stdin)?;
    let credentials = Credentials::new(&args.username, password);

    ctx.gate.login(&credentials).await?;
    print_success(&format!("Logado como {}", args.username));

    let landed = ctx.navigator.after_login().await?;
    print_info(&format!("Destino: {}", landed.path));
    Ok(())
}

async fn run_register(args: RegisterArgs, ctx: &AppContext) -> Result<()> {
    let (password, confirm) = if args.password_stdin {
        let mut lines = io::stdin().lock().lines();
        let password = lines.next().transpose()?.unwrap_or_default();
        let confirm = lines.next().transpose()?.unwrap_or_else(|| password.clone());
        (password, confirm)
    } else {
        (
            read_secret("Senha: ", false)?,
            read_secret("Confirme a senha: ", false)?,
        )
    };
    if password.is_empty() {
        bail!("Senha vazia");
    }

    let registration = Registration::new(
        args.nome_completo,
        args.email,
        &args.username,
        password,
        confirm,
    );
    ctx.gate.register(&registration).await?;
    print_success(&format!(
        "Conta {} criada. Faça login para continuar.",
        args.username
    ));
    Ok(())
}

async fn run_logout(ctx: &AppContext) -> Result<()> {
    ctx.gate.logout().await?;
    print_success("Sessão encerrada");
    Ok(())
}

async fn run_navigate(args: NavigateArgs, ctx: &AppContext) -> Result<()> {
    let landed = ctx.navigator.navigate(&args.path).await?;
    println!("{} ({})", landed.path, landed.name.as_deref().unwrap_or("-"));
    if let Some(requested) = ctx.navigator.routes().resolve(&args.path)
        && requested.path != landed.path
    {
        print_info(&format!("Redirecionado a partir de {}", requested.path));
    }
    Ok(())
}

fn run_routes(ctx: &AppContext) {
    println!("{:<22} {:<12} {:<8} REDIRECT", "PATH", "NAME", "ACCESS");
    for route in ctx.navigator.routes().routes() {
        let access = match (route.meta.requires_auth, route.meta.requires_guest) {
            (true, _) => "auth",
            (_, true) => "guest",
            _ => "public",
        };
        println!(
            "{:<22} {:<12} {:<8} {}",
            route.path,
            route.name.as_deref().unwrap_or("-"),
            access,
            route.redirect.as_deref().unwrap_or("")
        );
    }
}

async fn run_export(command: ExportCommand, ctx: &AppContext) -> Result<()> {
    let (args, document) = match command {
        ExportCommand::Csv(args) => (args, false),
        ExportCommand::Document(args) => (args, true),
    };

    let rows = read_rows(&args.input)?;
    let mut request = ExportRequest::new(args.columns, rows);
    request.filename_stem = args.name;
    request.title = args.title;
    request.subtitle = args.subtitle;

    let artifact = if document {
        ctx.exporter.export_document(&request).await?
    } else {
        ctx.exporter.export_csv(&request)?
    };

    match &artifact.location {
        Some(path) => print_success(&format!("Exportado: {}", path.display())),
        None => print_success(&format!("Exportado: {}", artifact.filename)),
    }
    Ok(())
}

fn show_config(ctx: &AppContext) -> Result<()> {
    let rendered = toml::to_string_pretty(&ctx.config).context("Failed to render config")?;
    println!("# {}", ctx.dirs.config_file().display());
    println!("{rendered}");
    println!("# effective api_base_url = {:?}", ctx.config.api_base_url());
    println!("# export dir = {:?}", ctx.export_dir().display().to_string());
    Ok(())
}

/// Read a secret from stdin, prompting when attached to a terminal.
fn read_secret(prompt: &str, piped: bool) -> Result<String> {
    let stdin = io::stdin();
    if !piped && stdin.is_terminal() {
        eprint!("{prompt}");
        io::stderr().flush()?;
    }
    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
