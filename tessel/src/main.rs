use clap::Parser as ClapParser;
use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
    process,
    sync::Arc,
    time::Duration,
};

use tessel::{
    EngineKind, EvalError, Evaluation, EventLoop, HostPlatform, Libraries, VM,
    VMCreateInfo,
};

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input source files to execute in order
    #[arg(required = false, help = "The .tsl files to execute (stdin if none)")]
    files: Vec<PathBuf>,

    #[arg(long, help = "Use the synchronous reference interpreter")]
    sync: bool,

    #[arg(long, default_value_t = 10, help = "Length of one engine tick")]
    time_slice_ms: u64,

    #[arg(long, help = "Load core/ and std/ libraries from this directory")]
    lib_dir: Option<PathBuf>,

    #[arg(long, help = "Start without the core and standard libraries")]
    no_libs: bool,

    #[arg(long, default_value_t = 10_000, help = "Nesting limit of the reference interpreter")]
    max_depth: usize,
}

struct Script {
    label: String,
    text: String,
}

fn read_scripts(files: &[PathBuf]) -> io::Result<Vec<Script>> {
    if files.is_empty() {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(vec![Script {
            label: "<stdin>".to_string(),
            text,
        }]);
    }
    files
        .iter()
        .map(|path| {
            Ok(Script {
                label: path.display().to_string(),
                text: fs::read_to_string(path)?,
            })
        })
        .collect()
}

fn run_script(
    vm: &mut VM,
    event_loop: &EventLoop,
    script: &Script,
) -> Result<String, EvalError> {
    let value = match vm.evaluate(&script.text, Some(&script.label))? {
        Evaluation::Ready(value) => value,
        Evaluation::Pending(pending) => {
            event_loop.run_until_idle(vm);
            vm.settle(Evaluation::Pending(pending))?
        }
    };
    Ok(vm.inspect(value))
}

fn run(cli: Cli) -> i32 {
    let libraries = match (&cli.lib_dir, cli.no_libs) {
        (_, true) => Libraries::empty(),
        (Some(dir), false) => match Libraries::from_dir(dir) {
            Ok(libraries) => libraries,
            Err(err) => {
                eprintln!("Error reading libraries from '{}': {}", dir.display(), err);
                return 1;
            }
        },
        (None, false) => Libraries::embedded(),
    };

    let scripts = match read_scripts(&cli.files) {
        Ok(scripts) => scripts,
        Err(err) => {
            eprintln!("Error reading input: {}", err);
            return 1;
        }
    };

    let event_loop = EventLoop::new();
    let platform = event_loop.attach(HostPlatform::new().with_libraries(libraries));
    let info = VMCreateInfo {
        engine: if cli.sync {
            EngineKind::Synchronous
        } else {
            EngineKind::Cooperative
        },
        time_slice: Duration::from_millis(cli.time_slice_ms),
        max_recursion_depth: cli.max_depth,
        load_libraries: !cli.no_libs,
        ..Default::default()
    };

    let mut vm = match VM::new(info, Arc::new(platform)) {
        Ok(vm) => vm,
        Err(err) => {
            eprintln!("{}", err.render());
            return 1;
        }
    };
    event_loop.run_until_idle(&mut vm);

    for script in &scripts {
        match run_script(&mut vm, &event_loop, script) {
            Ok(text) => println!("{text}"),
            Err(err) => {
                eprintln!("{}", err.render());
                return 1;
            }
        }
    }
    0
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    process::exit(run(cli));
}
