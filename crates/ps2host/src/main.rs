use ps2host::Scenario;

const USAGE: &str = "Usage: ps2host <scenario> [args]\n\
    \n\
    Scenarios:\n  \
      echo [count]      send random bytes to an echoing device\n  \
      send <hex-byte>   host sends one byte\n  \
      type <text>       device sends text to the host\n  \
      stall             device stalls mid-frame, watchdog recovers";

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let name = args.next().unwrap_or_else(|| "echo".to_string());

    let scenario = match name.as_str() {
        "echo" => {
            let count = args.next().map_or(Ok(16), |arg| arg.parse()).unwrap_or_else(|_| {
                eprintln!("Invalid count; expected a non-negative integer.");
                std::process::exit(2);
            });
            Scenario::Echo { count }
        }
        "send" => {
            let Some(arg) = args.next() else {
                eprintln!("{USAGE}");
                std::process::exit(2);
            };
            let byte = ps2host::parse_byte(&arg).unwrap_or_else(|err| {
                eprintln!("{err}");
                std::process::exit(2);
            });
            Scenario::Send(byte)
        }
        "type" => {
            let text = args.collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                eprintln!("{USAGE}");
                std::process::exit(2);
            }
            Scenario::Type(text)
        }
        "stall" => Scenario::Stall,
        "help" | "-h" | "--help" => {
            println!("{USAGE}");
            return;
        }
        other => {
            eprintln!("Unknown scenario '{}'.\n{}", other, USAGE);
            std::process::exit(2);
        }
    };

    log::info!("Running scenario '{}'", name);
    if let Err(err) = ps2host::run(scenario) {
        eprintln!("Scenario '{}' failed: {err:#}", name);
        std::process::exit(1);
    }
}
