//! Bookrent - command line client for the book rental catalog

use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bookrent_client::{
    config::LoggingConfig,
    models::{Availability, Credentials, Registration, Role, SortOption},
    routes::{Access, Route},
    views::{
        rent_from_card, render_field_errors, Action, AddBookForm, BookAction, BookDetailView,
        BookListView, Feedback, Notice, NOT_FOUND_MESSAGE,
    },
    App, AppConfig, AppError, AppResult,
};

/// Bookrent - browse, rent and return books from the command line
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in and keep the session token
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "BOOKRENT_PASSWORD", hide_env_values = true)]
        password: String,

        /// Path to continue to after logging in
        #[arg(long)]
        from: Option<String>,
    },

    /// Create an account (does not log in)
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "BOOKRENT_PASSWORD", hide_env_values = true)]
        password: String,

        /// Account role [user, admin]
        #[arg(long, default_value = "user")]
        role: Role,
    },

    /// Forget the session token
    Logout,

    /// Show the logged-in user
    Whoami,

    /// List books
    Books {
        /// Author substring
        #[arg(short, long)]
        author: Option<String>,

        /// [all, available, rented]
        #[arg(long, default_value = "all")]
        availability: Availability,

        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// [newest, oldest]
        #[arg(short, long, default_value = "newest")]
        sort: SortOption,
    },

    /// Show one book
    Show { id: i64 },

    /// Rent an available book
    Rent { id: i64 },

    /// Return a rented book
    Return { id: i64 },

    /// Add a book (administrators only)
    Add {
        #[arg(long)]
        title: String,

        #[arg(long)]
        author: String,

        /// YYYY-MM-DD
        #[arg(long)]
        published_date: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Wipe the token and all client state
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;
    let _guard = init_tracing(&config.logging);

    tracing::debug!("Bookrent client v{}", env!("CARGO_PKG_VERSION"));

    let app = App::new(config).context("Failed to initialize client")?;
    let session = app.services.auth.restore().await;
    tracing::debug!(status = ?session.status, "Session restored");

    match run(&app, cli.command).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            if e.is_auth() {
                eprintln!("Your session has expired. Please log in again.");
            } else if let Some(fields) = e.field_errors() {
                eprintln!("{}", render_field_errors(&fields));
            }
            tracing::debug!("Command failed: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn init_tracing(logging: &LoggingConfig) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("bookrent_client={0},bookrent={0}", logging.level).into()
    });

    let json = logging.format == "json";
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(writer.clone())))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(writer)))
        .init();

    guard
}

async fn run(app: &App, command: Commands) -> AppResult<()> {
    let services = &app.services;

    match command {
        Commands::Login {
            email,
            password,
            from,
        } => {
            let credentials = Credentials::new(email, password);
            let from = from.as_deref().map(Route::parse);
            match services.auth.login(&credentials, from).await {
                Ok(next) => {
                    let session = app.session();
                    let name = session.user.map(|u| u.name).unwrap_or_default();
                    println!("Logged in as {}. Continue at {}", name, next);
                    Ok(())
                }
                Err(e) => {
                    if let Some(message) = app.session().error {
                        eprintln!("{}", message);
                    }
                    Err(e)
                }
            }
        }

        Commands::Register {
            name,
            email,
            password,
            role,
        } => {
            let registration = Registration {
                name: name.trim().to_string(),
                email: email.trim().to_string(),
                password,
                role,
            };
            match services.auth.register(&registration).await {
                Ok(next) => {
                    println!("Registration successful. Please log in at {}", next);
                    Ok(())
                }
                Err(e) => {
                    if let Some(message) = app.session().error {
                        eprintln!("{}", message);
                    }
                    Err(e)
                }
            }
        }

        Commands::Logout => {
            services.auth.logout().await?;
            println!("Logged out");
            Ok(())
        }

        Commands::Whoami => {
            let session = app.session();
            match session.user {
                Some(user) => println!("{} <{}> ({})", user.name, user.email.unwrap_or_default(), user.role),
                None => println!("Not logged in"),
            }
            Ok(())
        }

        Commands::Books {
            author,
            availability,
            page,
            sort,
        } => {
            let filters = &services.filters;
            filters.set_author(author.unwrap_or_default().trim());
            filters.set_availability(availability);
            filters.set_page(page);
            filters.set_sort(sort);

            let current = app.filters();
            match services.books.list_filtered(&current).await {
                Ok(page) => {
                    println!("{}", BookListView::new(page, current).render());
                    Ok(())
                }
                Err(e) => fail(Action::LoadBooks, e.into()),
            }
        }

        Commands::Show { id } => match services.books.get(id).await {
            Ok(book) => {
                println!("{}", BookDetailView::new(book).render());
                Ok(())
            }
            Err(e) => {
                eprintln!("{}", NOT_FOUND_MESSAGE);
                fail(Action::LoadBook, e.into())
            }
        },

        Commands::Rent { id } => {
            let book = match services.books.get(id).await {
                Ok(book) => book,
                Err(e) => return fail(Action::LoadBook, e.into()),
            };
            match rent_from_card(&services.books, &book).await {
                None => {
                    println!("\"{}\" is currently rented", book.title);
                    Ok(())
                }
                Some(result) => report(Action::Rent, result),
            }
        }

        Commands::Return { id } => {
            let book = match services.books.get(id).await {
                Ok(book) => book,
                Err(e) => return fail(Action::LoadBook, e.into()),
            };
            let view = BookDetailView::new(book);
            if view.action() != BookAction::Return {
                println!("\"{}\" is not rented", view.book().title);
                return Ok(());
            }
            let result = view.perform(&services.books).await;
            report(Action::Return, result)
        }

        Commands::Add {
            title,
            author,
            published_date,
            description,
        } => {
            match app.open(&Route::AddBook) {
                Access::Allow => {}
                Access::Redirect { to: Route::Login, .. } => {
                    eprintln!("Log in to add books");
                    return Ok(());
                }
                _ => {
                    eprintln!("Only administrators can add books");
                    return Ok(());
                }
            }

            let form = AddBookForm::new(&title, &author, &published_date, description.as_deref());
            let book = form.submit().map_err(AppError::Validation)?;
            let result = services.books.add(&book).await.map_err(AppError::from);
            report(Action::Add, result)
        }

        Commands::Reset => {
            let next = app.reset().await;
            println!("Client state cleared. Continue at {}", next);
            Ok(())
        }
    }
}

/// Print the notice for a finished mutation
fn report<T>(action: Action, result: AppResult<T>) -> AppResult<()> {
    match result {
        Ok(_) => {
            if let Some(notice) = Notice::success(action) {
                println!("{}", notice);
            }
            Ok(())
        }
        Err(e) => fail(action, e),
    }
}

/// Print the notice for a failed action; field errors are printed by the caller
fn fail(action: Action, error: AppError) -> AppResult<()> {
    if let Feedback::Notice(notice) = Feedback::from_error(action, &error) {
        eprintln!("{}", notice);
    }
    Err(error)
}
