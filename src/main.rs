use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use clap::Parser;
use rcfix::naming::resolve_name;
use rcfix::{Descriptor, ServiceFixer};

#[derive(Parser)]
#[command(name = "rcfix")]
#[command(about = "Convert a systemd service unit into a SysV init script")]
#[command(
    long_about = "rcfix reads a systemd .service file (from SOURCE or stdin) and writes \
    an /etc/init.d style shell script (to DEST or stdout). Unknown or malformed \
    directives are ignored."
)]
struct Args {
    /// Service name (defaults to the SOURCE file name without extension)
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// User the service runs as
    #[arg(short = 'u', long)]
    user: Option<String>,

    /// Group the service runs as
    #[arg(short = 'g', long)]
    group: Option<String>,

    /// Unit file to read (stdin if omitted)
    source: Option<PathBuf>,

    /// Where to write the init script (stdout if omitted)
    dest: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = Vec::new();
    match &args.source {
        Some(path) => {
            File::open(path)
                .and_then(|mut f| f.read_to_end(&mut input))
                .map_err(|e| format!("{}: {}", path.display(), e))?;
        }
        None => {
            io::stdin().lock().read_to_end(&mut input)?;
        }
    }

    let mut fixer = ServiceFixer::new(args.name.clone().unwrap_or_default());
    if let Some(user) = &args.user {
        fixer = fixer.with_user(user);
    }
    if let Some(group) = &args.group {
        fixer = fixer.with_group(group);
    }

    // One write: the whole unit must be parsed in a single pass
    fixer.write_all(&input)?;

    let empty = Descriptor::new();
    let descriptor = fixer.descriptor().unwrap_or(&empty);
    let name = resolve_name(args.name.as_deref(), args.source.as_deref(), descriptor);
    log::info!("Service name: {}", name);
    fixer.set_name(name);

    // Render before touching DEST so a failure leaves no half-written file
    fixer.fix()?;

    match &args.dest {
        Some(path) => {
            let mut file = File::create(path)
                .map_err(|e| format!("{}: {}", path.display(), e))?;
            io::copy(&mut fixer, &mut file)?;
            fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
            log::info!("Wrote init script for {} to {}", fixer.name(), path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            io::copy(&mut fixer, &mut stdout)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
