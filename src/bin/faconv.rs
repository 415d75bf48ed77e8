use std::io::{self, BufWriter, Write};
#[cfg(unix)]
use std::mem::ManuallyDrop;
#[cfg(unix)]
use std::os::unix::io::FromRawFd;
use std::process;

use aconv::case::{self, CaseConverter, DispatchError, LaneWidth, Mode};
use aconv::case::{SWITCH_LOWERCASE, SWITCH_UPPERCASE};
use aconv::common::{enlarge_pipes, io_error_msg, reset_sigpipe, tool_name};

/// Wrong number of mode switches.
const EXIT_USAGE: i32 = 2;
/// Mode switch (or option value) not recognised.
const EXIT_BAD_SWITCH: i32 = 4;

/// Where the lane width comes from.
enum Lanes {
    Compiled,
    Detected,
    Fixed(LaneWidth),
}

struct Cli {
    mode: Mode,
    lanes: Lanes,
    show_lanes: bool,
}

fn usage(tool: &str) -> String {
    format!(
        "{tool} [ {lo} | {up} ]\n\
         Where:\n\
         {lo} : Transform input to lower case\n\
         {up} : Transform input to upper case\n",
        tool = tool,
        lo = SWITCH_LOWERCASE,
        up = SWITCH_UPPERCASE,
    )
}

fn usage_error(tool: &str, code: i32) -> ! {
    eprint!("{}", usage(tool));
    process::exit(code);
}

fn parse_lanes(tool: &str, value: &str) -> Lanes {
    if value == "auto" {
        return Lanes::Detected;
    }
    match LaneWidth::parse(value) {
        Some(w) => Lanes::Fixed(w),
        None => {
            eprintln!(
                "{}: invalid lane width '{}' (expected auto, scalar, 0, 8, 16, 32 or 64)",
                tool, value
            );
            usage_error(tool, EXIT_BAD_SWITCH);
        }
    }
}

fn parse_args(tool: &str) -> Cli {
    let mut switches: Vec<Vec<u8>> = Vec::new();
    let mut lanes = Lanes::Compiled;
    let mut show_lanes = false;

    let mut args = std::env::args_os().skip(1);
    while let Some(arg) = args.next() {
        let bytes = arg.as_encoded_bytes();
        match bytes {
            b"--help" => {
                print!(
                    "Usage: {tool} [--lanes=WIDTH] [--lanes-info] ( {lo} | {up} )\n\
                     Convert ASCII text from standard input to one case.\n\n\
                     \x20 {lo}                 transform input to lower case\n\
                     \x20 {up}                 transform input to upper case\n\
                     \x20     --lanes=WIDTH  vector width in bytes: auto, scalar, 0, 8, 16, 32, 64\n\
                     \x20                      (default: {compiled}, the width this build targets)\n\
                     \x20     --lanes-info   print the selected and detected widths to stderr\n\
                     \x20     --help         display this help and exit\n\
                     \x20     --version      output version information and exit\n",
                    tool = tool,
                    lo = SWITCH_LOWERCASE,
                    up = SWITCH_UPPERCASE,
                    compiled = LaneWidth::COMPILED,
                );
                process::exit(0);
            }
            b"--version" => {
                println!("{} (fcoreutils) {}", tool, env!("CARGO_PKG_VERSION"));
                process::exit(0);
            }
            b"--lanes-info" => show_lanes = true,
            b"--lanes" => match args.next() {
                Some(value) => lanes = parse_lanes(tool, &value.to_string_lossy()),
                None => {
                    eprintln!("{}: option '--lanes' requires an argument", tool);
                    usage_error(tool, EXIT_USAGE);
                }
            },
            _ if bytes.starts_with(b"--lanes=") => {
                lanes = parse_lanes(tool, &String::from_utf8_lossy(&bytes[8..]));
            }
            _ => switches.push(bytes.to_vec()),
        }
    }

    if switches.len() != 1 {
        usage_error(tool, EXIT_USAGE);
    }
    let mode = match Mode::from_switch(&switches[0]) {
        Some(mode) => mode,
        None => {
            eprintln!(
                "{}: unrecognized switch '{}'",
                tool,
                String::from_utf8_lossy(&switches[0])
            );
            usage_error(tool, EXIT_BAD_SWITCH);
        }
    };

    Cli {
        mode,
        lanes,
        show_lanes,
    }
}

fn prepare(cli: &Cli) -> Result<CaseConverter, DispatchError> {
    match cli.lanes {
        Lanes::Compiled => CaseConverter::prepare_compiled(cli.mode),
        Lanes::Detected => CaseConverter::prepare_detected(cli.mode),
        Lanes::Fixed(w) => CaseConverter::prepare(cli.mode, w),
    }
}

fn main() {
    reset_sigpipe();

    let tool = tool_name(env!("CARGO_BIN_NAME"));
    let cli = parse_args(tool);

    let conv = match prepare(&cli) {
        Ok(conv) => conv,
        Err(e) => {
            eprintln!("{}: error: {}. Exiting...", tool, e);
            process::exit(e.exit_code());
        }
    };

    if cli.show_lanes {
        let detected = case::detect();
        eprintln!(
            "{}: lanes={} ({}) detected={} ({})",
            tool,
            conv.lanes(),
            conv.lanes().isa(),
            detected,
            detected.isa()
        );
    }

    enlarge_pipes();

    #[cfg(unix)]
    let stdout_raw = unsafe { ManuallyDrop::new(std::fs::File::from_raw_fd(1)) };
    #[cfg(unix)]
    let mut out = BufWriter::with_capacity(256 * 1024, &*stdout_raw);
    #[cfg(not(unix))]
    let stdout = io::stdout();
    #[cfg(not(unix))]
    let mut out = BufWriter::with_capacity(256 * 1024, stdout.lock());

    let stdin = io::stdin();
    let mut input = stdin.lock();

    let result = case::convert_stream(&conv, &mut input, &mut out).and_then(|_| out.flush());
    if let Err(e) = result {
        if e.kind() == io::ErrorKind::BrokenPipe {
            process::exit(0);
        }
        eprintln!("{}: {}", tool, io_error_msg(&e));
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::process::{Command, Output, Stdio};

    use aconv::case::{LaneWidth, detect};

    fn cmd() -> Command {
        let mut path = std::env::current_exe().unwrap();
        path.pop();
        path.pop();
        path.push("faconv");
        Command::new(path)
    }

    fn run(args: &[&str], input: &[u8]) -> Output {
        let mut child = cmd()
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        // The child may exit on a usage error before reading stdin.
        let _ = child.stdin.take().unwrap().write_all(input);
        child.wait_with_output().unwrap()
    }

    #[test]
    fn test_upper_stdin() {
        let output = run(&["--lanes=auto", "-A"], b"Hello, World! 123\n");
        assert!(output.status.success());
        assert_eq!(output.stdout, b"HELLO, WORLD! 123\n");
    }

    #[test]
    fn test_lower_stdin() {
        let output = run(&["--lanes=auto", "-a"], b"Hello, World! 123\n");
        assert!(output.status.success());
        assert_eq!(output.stdout, b"hello, world! 123\n");
    }

    #[test]
    fn test_default_width() {
        let output = run(&["-A"], b"abc\n");
        if LaneWidth::COMPILED <= detect() {
            assert!(output.status.success());
            assert_eq!(output.stdout, b"ABC\n");
        } else {
            assert_eq!(output.status.code(), Some(3));
        }
    }

    #[test]
    fn test_empty_input() {
        let output = run(&["--lanes", "scalar", "-A"], b"");
        assert!(output.status.success());
        assert_eq!(output.stdout, b"");
    }

    #[test]
    fn test_multiple_lines_no_trailing_newline() {
        let output = run(&["--lanes=auto", "-a"], b"ONE\n\nTwo\nTHREE");
        assert!(output.status.success());
        assert_eq!(output.stdout, b"one\n\ntwo\nthree");
    }

    #[test]
    fn test_long_run_every_width() {
        let mut input = vec![b'm'; 130];
        input.push(b'\n');
        let mut want = vec![b'M'; 130];
        want.push(b'\n');
        for w in LaneWidth::ALL.iter().filter(|&&w| w <= detect()) {
            let arg = format!("--lanes={}", w);
            let output = run(&[arg.as_str(), "-A"], &input);
            assert!(output.status.success(), "lanes {}", w);
            assert_eq!(output.stdout, want, "lanes {}", w);
        }
    }

    #[test]
    fn test_boundary_bytes() {
        let output = run(&["--lanes=auto", "-a"], b"@A[`\x7f\n");
        assert!(output.status.success());
        assert_eq!(output.stdout, b"@a[`\x7f\n");
        let output = run(&["--lanes=auto", "-A"], b"@A[`\x7f\n");
        assert_eq!(output.stdout, b"@A[`\x7f\n");
    }

    #[test]
    fn test_binary_bytes_pass_through() {
        let input = b"\x00\x80\xffz\xc3\xa9\n";
        let output = run(&["--lanes=auto", "-A"], input);
        assert!(output.status.success());
        assert_eq!(output.stdout, b"\x00\x80\xffZ\xc3\xa9\n");
    }

    #[test]
    fn test_stdin_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("input.txt");
        let line: String = (0..5000)
            .map(|i| (b'a' + (i % 26) as u8) as char)
            .collect();
        std::fs::write(&file, format!("{}\n{}\n", line, line)).unwrap();
        let output = cmd()
            .args(["--lanes=auto", "-A"])
            .stdin(Stdio::from(std::fs::File::open(&file).unwrap()))
            .output()
            .unwrap();
        assert!(output.status.success());
        let upper = line.to_ascii_uppercase();
        assert_eq!(
            String::from_utf8_lossy(&output.stdout),
            format!("{}\n{}\n", upper, upper)
        );
    }

    #[test]
    fn test_no_arguments() {
        let output = run(&[], b"");
        assert_eq!(output.status.code(), Some(2));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("-a : Transform input to lower case"));
        assert!(stderr.contains("-A : Transform input to upper case"));
        assert!(output.stdout.is_empty());
    }

    #[test]
    fn test_too_many_arguments() {
        let output = run(&["-a", "-A"], b"x\n");
        assert_eq!(output.status.code(), Some(2));
        assert!(output.stdout.is_empty());
    }

    #[test]
    fn test_unrecognized_switch() {
        let output = run(&["-x"], b"x\n");
        assert_eq!(output.status.code(), Some(4));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("unrecognized switch '-x'"));
        assert!(output.stdout.is_empty());
    }

    #[test]
    fn test_unknown_long_option_is_bad_switch() {
        let output = run(&["--shout"], b"x\n");
        assert_eq!(output.status.code(), Some(4));
    }

    #[test]
    fn test_invalid_lanes_value() {
        let output = run(&["--lanes=12", "-A"], b"x\n");
        assert_eq!(output.status.code(), Some(4));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("invalid lane width '12'"));
    }

    #[test]
    fn test_missing_lanes_value() {
        let output = run(&["-A", "--lanes"], b"x\n");
        assert_eq!(output.status.code(), Some(2));
    }

    #[test]
    fn test_width_wider_than_cpu() {
        let output = run(&["--lanes=64", "-A"], b"abc\n");
        if detect() < LaneWidth::W64 {
            assert_eq!(output.status.code(), Some(3));
            let stderr = String::from_utf8_lossy(&output.stderr);
            assert!(stderr.contains("wider than available"));
            assert!(output.stdout.is_empty());
        } else {
            assert!(output.status.success());
            assert_eq!(output.stdout, b"ABC\n");
        }
    }

    #[test]
    fn test_lanes_info() {
        let output = run(&["--lanes=scalar", "--lanes-info", "-a"], b"ABC\n");
        assert!(output.status.success());
        assert_eq!(output.stdout, b"abc\n");
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("aconv: lanes=0 (scalar) detected="));
    }

    #[test]
    fn test_help() {
        let output = cmd().arg("--help").output().unwrap();
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Usage: aconv"));
        assert!(stdout.contains("--lanes=WIDTH"));
    }

    #[test]
    fn test_version() {
        let output = cmd().arg("--version").output().unwrap();
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.starts_with("aconv (fcoreutils) "));
    }
}
