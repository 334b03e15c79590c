use std::env;
use std::process;
use std::time::SystemTime;

use domain::adapters::memory_repo::InMemoryRepo;
use domain::service::CatalogService;
use domain::{CatalogEntity, CatalogKind, Clock, CoreError};

struct StdClock;
impl Clock for StdClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

fn print_usage() {
    eprintln!(
        "{}\n\nUsage:\n  domain create <brand|type> <name>...\n  domain list <brand|type>\n\nNotes:\n  - This demo CLI uses an in-memory repository; data is not persisted across runs.",
        domain::about()
    );
}

fn print_entity(kind: CatalogKind, e: &CatalogEntity) {
    println!("{} #{}: {}", kind, e.id, e.name);
}

fn parse_kind(arg: Option<String>) -> Result<CatalogKind, String> {
    let Some(raw) = arg else {
        return Err("missing <brand|type>".into());
    };
    CatalogKind::parse(&raw).ok_or_else(|| format!("unknown kind: {}", raw))
}

fn run() -> Result<(), String> {
    let mut args = env::args().skip(1); // skip program name

    let Some(cmd) = args.next() else {
        print_usage();
        return Ok(());
    };

    let svc = CatalogService::new(InMemoryRepo::new(), StdClock);

    match cmd.as_str() {
        "create" => {
            let kind = parse_kind(args.next())?;
            let names: Vec<String> = args.collect();
            if names.is_empty() {
                return Err("missing <name> for create".into());
            }
            for name in &names {
                match svc.create(kind, Some(name.as_str())) {
                    Ok(e) => print_entity(kind, &e),
                    Err(CoreError::AlreadyExists) => {
                        return Err(format!("{} '{}' already exists", kind, name.trim()))
                    }
                    Err(e) => return Err(format!("create failed: {}", e)),
                }
            }
            Ok(())
        }
        "list" => {
            let kind = parse_kind(args.next())?;
            let rows = svc
                .list(kind)
                .map_err(|e| format!("list failed: {}", e))?;
            if rows.is_empty() {
                println!("no {} entries", kind);
            }
            for e in &rows {
                print_entity(kind, e);
            }
            Ok(())
        }
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn main() {
    if let Err(msg) = run() {
        eprintln!("error: {}", msg);
        process::exit(1);
    }
}
