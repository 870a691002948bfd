use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use hexad::text::{parse_grid, parse_int_grid, render_grid};
use hexad::common::NodeKind;
use hexad::core::{Availability, availability};
use hexad::store::{Tree, list_grid};
use hexad::{
    CellValue, JsonBackend, SaveDestination, SelectionSpec, Session, SessionConfig,
    parse_chunk_spec, parse_dimensions, parse_schema,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_ENV: &str = "HEXAD_LOG";

#[derive(Parser, Debug)]
#[command(name = "hexad", version, about = "Spreadsheet-style access to a JSON array store")]
struct Cli {
    /// Store document to operate on. Created on first write when missing.
    #[arg(long, global = true, default_value = "hexad.json")]
    store: PathBuf,

    /// Session settings as JSON (default type, table compression, limits).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a table heading and print one field per line.
    Schema { heading: String },
    /// Parse a size grid such as `12,-16` and print the shape.
    Dims {
        #[arg(allow_hyphen_values = true)]
        size: String,
    },
    /// Parse a chunk specification such as `[64 64]`.
    Chunk { spec: String },
    /// Report whether a path names an object and what kind of link it is.
    Path { path: String },
    NewGroup { path: String },
    NewArray {
        path: String,
        #[arg(allow_hyphen_values = true)]
        size: String,
        /// Property list, e.g. `DATATYPE,int32,CHUNKSIZE,[64]`.
        #[arg(long, default_value = "")]
        props: String,
    },
    NewTable {
        path: String,
        heading: String,
        #[arg(long, default_value = "")]
        props: String,
    },
    /// Write a grid into an array, creating it when the path is free.
    Write {
        path: String,
        #[arg(allow_hyphen_values = true)]
        grid: String,
        #[command(flatten)]
        coords: Coords,
    },
    /// Append rows to the end of a one-dimensional array or table.
    Append {
        path: String,
        #[arg(allow_hyphen_values = true)]
        grid: String,
    },
    /// Overwrite selected table fields starting at a row.
    WriteRows {
        path: String,
        #[arg(allow_hyphen_values = true)]
        grid: String,
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
        #[arg(long, allow_negative_numbers = true)]
        row: Option<i64>,
    },
    Read {
        path: String,
        #[command(flatten)]
        coords: Coords,
    },
    ReadTable {
        path: String,
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
        #[command(flatten)]
        coords: Coords,
    },
    Info {
        #[arg(default_value = "/")]
        path: String,
    },
    List {
        #[arg(default_value = "/")]
        path: String,
    },
    Tree {
        #[arg(default_value = "/")]
        path: String,
    },
    #[command(subcommand)]
    Attr(AttrCommand),
}

#[derive(Subcommand, Debug)]
enum AttrCommand {
    Get { path: String, name: String },
    Set {
        path: String,
        name: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
}

/// 1-based hyperslab coordinates, comma-separated per dimension.
#[derive(Args, Debug, Default)]
struct Coords {
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    first: Vec<i64>,
    /// Negative entries read or write through the end of the dimension.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    last: Vec<i64>,
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    step: Vec<i64>,
}

impl Coords {
    fn to_spec(&self) -> SelectionSpec {
        let given = |v: &Vec<i64>| (!v.is_empty()).then(|| v.clone());
        SelectionSpec {
            first: given(&self.first),
            last: given(&self.last),
            step: given(&self.step),
        }
    }
}

fn set_up_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing config {}", path.display()))
}

fn load_backend(path: &Path) -> Result<JsonBackend> {
    if path.exists() {
        JsonBackend::open_path(path).with_context(|| format!("opening store {}", path.display()))
    } else {
        Ok(JsonBackend::new())
    }
}

fn not_an_integer(cell: String) -> anyhow::Error {
    anyhow::anyhow!("size entries must be integers, found {cell:?}")
}

fn fields_arg(fields: &[String]) -> Option<&[String]> {
    (!fields.is_empty()).then_some(fields)
}

fn print_tree(out: &mut impl Write, tree: &Tree) -> Result<()> {
    for (col, name) in &tree.rows {
        writeln!(out, "{}{name}", "  ".repeat(col.saturating_sub(1)))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    set_up_logging();
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    // Parser-only commands never touch the store.
    match &cli.command {
        Command::Schema { heading } => {
            let schema = parse_schema(heading)?;
            for field in schema.fields() {
                match &field.fill {
                    Some(fill) => writeln!(out, "{}\t{}\t{fill}", field.name, field.dtype)?,
                    None => writeln!(out, "{}\t{}", field.name, field.dtype)?,
                }
            }
            return Ok(());
        }
        Command::Dims { size } => {
            let size = parse_int_grid(size).map_err(not_an_integer)?;
            let shape = parse_dimensions(&size)?;
            writeln!(out, "{shape}\t{}", shape.bounds_string())?;
            return Ok(());
        }
        Command::Chunk { spec } => {
            let chunk = parse_chunk_spec(spec)?;
            let parts: Vec<String> = chunk.iter().map(u64::to_string).collect();
            writeln!(out, "[{}]", parts.join(" "))?;
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(cli.config.as_deref())?;
    let mut backend = load_backend(&cli.store)?;
    let mut session = Session::with_config(std::mem::take(backend.store_mut()), config);

    let dirty = match cli.command {
        Command::Schema { .. } | Command::Dims { .. } | Command::Chunk { .. } => false,
        Command::Path { path } => {
            let c = session.classify(&path)?;
            let link = c.link.map_or_else(|| "-".to_string(), |l| l.to_string());
            let free = |kind| -> Result<&'static str> {
                Ok(match availability(session.store(), &path, kind)? {
                    Availability::Free => "free",
                    Availability::Reuse => "reuse",
                    Availability::Blocked(_) => "blocked",
                })
            };
            writeln!(
                out,
                "valid\t{}\nlink\t{link}\ngroup\t{}\nleaf\t{}",
                c.valid,
                free(NodeKind::Container)?,
                free(NodeKind::Leaf)?
            )?;
            false
        }
        Command::NewGroup { path } => {
            session.new_group(&path)?;
            true
        }
        Command::NewArray { path, size, props } => {
            let size = parse_int_grid(&size).map_err(not_an_integer)?;
            session.new_array(&path, &size, &props)?;
            true
        }
        Command::NewTable {
            path,
            heading,
            props,
        } => {
            session.new_table(&path, &heading, &props)?;
            true
        }
        Command::Write { path, grid, coords } => {
            let shape = session.write_array(&path, &parse_grid(&grid), &coords.to_spec())?;
            writeln!(out, "{shape}")?;
            true
        }
        Command::Append { path, grid } => {
            let rows = session.append_rows(&path, &parse_grid(&grid))?;
            writeln!(out, "{rows}")?;
            true
        }
        Command::WriteRows {
            path,
            grid,
            fields,
            row,
        } => {
            let rows = session.write_rows(&path, &parse_grid(&grid), fields_arg(&fields), row)?;
            writeln!(out, "{rows}")?;
            true
        }
        Command::Read { path, coords } => {
            let grid = session.read_array(&path, &coords.to_spec())?;
            out.write_all(render_grid(&grid).as_bytes())?;
            false
        }
        Command::ReadTable {
            path,
            fields,
            coords,
        } => {
            let grid = session.read_table(&path, fields_arg(&fields), &coords.to_spec())?;
            out.write_all(render_grid(&grid).as_bytes())?;
            false
        }
        Command::Info { path } => {
            let rows: Vec<Vec<CellValue>> =
                session.get_info(&path)?.iter().map(|r| r.to_cells()).collect();
            out.write_all(render_grid(&rows).as_bytes())?;
            false
        }
        Command::List { path } => {
            let rows = session.show_list(&path)?;
            out.write_all(render_grid(&list_grid(&rows)).as_bytes())?;
            false
        }
        Command::Tree { path } => {
            print_tree(&mut out, &session.show_tree(&path)?)?;
            false
        }
        Command::Attr(AttrCommand::Get { path, name }) => {
            writeln!(out, "{}", session.read_attribute(&path, &name)?)?;
            false
        }
        Command::Attr(AttrCommand::Set { path, name, value }) => {
            session.write_attribute(&path, &name, &CellValue::parse(&value))?;
            true
        }
    };

    if dirty {
        *backend.store_mut() = session.into_store();
        backend
            .save_to(SaveDestination::Path(&cli.store))
            .with_context(|| format!("saving store {}", cli.store.display()))?;
    }
    Ok(())
}
