use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use burrowdb::{Database, Operator, PAGE_SIZE, PageId, Permission};

#[derive(Parser)]
#[command(author, version, about = "burrow - inspect burrowdb heap files")]
struct Cli {
    /// Heap file to inspect
    #[arg(short, long)]
    file: String,

    /// Buffer pool size (number of pages)
    #[arg(short, long, default_value_t = 64)]
    buffer_size: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show page and tuple counts
    Info,

    /// Hex dump of one page
    Dump {
        /// Page number
        page_no: u32,
    },

    /// Print every tuple
    Scan,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let db = Database::new(cli.buffer_size);
    let table_id = db
        .register_table("inspect", &cli.file)
        .with_context(|| format!("cannot open {}", cli.file))?;
    let file = db
        .catalog()
        .file(table_id)
        .context("table missing from catalog")?;

    match cli.command {
        Commands::Info => {
            let tid = db.begin_transaction();
            let mut scan = db.scan(tid, table_id)?;
            scan.open()?;
            let mut tuples = 0usize;
            while scan.next()?.is_some() {
                tuples += 1;
            }
            scan.close()?;
            db.commit(tid)?;
            println!(
                "{}: {} pages of {} bytes, {} live tuples",
                cli.file,
                file.num_pages()?,
                PAGE_SIZE,
                tuples
            );
        }
        Commands::Dump { page_no } => {
            let tid = db.begin_transaction();
            let page = db
                .buffer_pool()
                .get_page(tid, PageId::new(table_id, page_no), Permission::Shared)?;
            {
                let guard = page.read();
                for (i, chunk) in guard.data().chunks(32).enumerate() {
                    println!("{:06x}  {}", i * 32, hex::encode(chunk));
                }
            }
            db.commit(tid)?;
        }
        Commands::Scan => {
            let tid = db.begin_transaction();
            let mut scan = db.scan(tid, table_id)?;
            scan.open()?;
            while let Some(tuple) = scan.next()? {
                let cells: Vec<String> = tuple.fields().iter().map(|f| f.to_string()).collect();
                println!("{}", cells.join(" | "));
            }
            scan.close()?;
            db.commit(tid)?;
        }
    }

    Ok(())
}
