use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use anyhow::Result;
use clap::{App, load_yaml, value_t};
use crossbeam_channel::bounded;
use env_logger::Builder;
use jemallocator::Jemalloc;
use log::{info, warn};
use log::LevelFilter::*;
use signal_hook::{consts::{SIGINT, SIGTERM}, flag::register};
use ipfix::{Elements, Process, Protocol};
use antler::args::req;
use antler::exporter::{Config, Family, FlowExporter};
use antler::flows::{FlowRecords, Source};

#[global_allocator]
static ALLOC: Jemalloc = Jemalloc;

fn main() -> Result<()> {
    let yaml = load_yaml!("args.yml");
    let ver  = env!("CARGO_PKG_VERSION");
    let args = App::from_yaml(&yaml).version(ver).get_matches();

    let collector = value_t!(args, "collector",   String)?;
    let conns     = value_t!(args, "connections", String)?;
    let protocol  = req::<Protocol>(args.value_of("protocol"), "protocol")?;
    let family    = req::<Family>(args.value_of("family"), "family")?;
    let domain    = value_t!(args, "domain",           u32)?;
    let template  = value_t!(args, "template-id",      u16)?;
    let frequency = value_t!(args, "export-frequency", u64)?;
    let interval  = value_t!(args, "interval",         u64)?;

    let (module, level) = match args.occurrences_of("verbose") {
        0 => (Some(module_path!()), Info),
        1 => (Some(module_path!()), Debug),
        2 => (Some(module_path!()), Trace),
        _ => (None,                 Trace),
    };
    Builder::from_default_env().filter(module, level).init();

    info!("initializing antler {}", ver);

    let shutdown = Arc::new(AtomicBool::new(false));
    register(SIGTERM, shutdown.clone())?;
    register(SIGINT,  shutdown.clone())?;

    let config = Config {
        template_id:      template,
        export_frequency: frequency,
        family:           family,
    };

    let records  = Arc::new(FlowRecords::new());
    let process  = Process::connect(&collector, protocol, domain)?;
    let mut export = FlowExporter::new(records.clone(), process, Elements::new(), config)?;

    let (tx, rx) = bounded(16);
    let interval = Duration::from_secs(interval);
    let source   = Source::watch(PathBuf::from(conns), interval, tx, shutdown.clone())?;

    let timeout = Duration::from_millis(100);

    while !shutdown.load(Ordering::Acquire) {
        if let Ok(conns) = rx.recv_timeout(timeout) {
            records.update(conns);
            if let Err(e) = export.export() {
                warn!("export cycle {} failed: {}", export.cycle(), e);
            }
        }
    }

    drop(rx);
    if source.join().is_err() {
        warn!("source thread panicked");
    }

    export.into_transport().close();

    Ok(())
}
