// SPDX-License-Identifier: MPL-2.0
use iced_gaze::app::{self, paths, Flags};

const HELP: &str = "\
iced_gaze - webcam gaze tracking tests

USAGE:
    iced_gaze [OPTIONS]

OPTIONS:
    --lang <LOCALE>        Interface language (e.g. en-US, fr)
    --api-url <URL>        Backend base URL
    --token <TOKEN>        Store an access token for the backend
    --test-mode            Use the simulated camera and calibration
    --play <TEST_ID>       Open the player for a stored test
    --data-dir <PATH>      Directory for persisted state
    --config-dir <PATH>    Directory holding settings.toml
    -h, --help             Print this help
";

fn main() -> iced::Result {
    let mut args = pico_args::Arguments::from_env();

    if args.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let flags = Flags {
        lang: optional_value(&mut args, "--lang"),
        api_url: optional_value(&mut args, "--api-url"),
        token: optional_value(&mut args, "--token"),
        test_mode: args.contains("--test-mode"),
        data_dir: optional_value(&mut args, "--data-dir"),
        config_dir: optional_value(&mut args, "--config-dir"),
        play: optional_value(&mut args, "--play"),
    };

    let remaining = args.finish();
    if !remaining.is_empty() {
        eprintln!("Ignoring unexpected arguments: {remaining:?}");
    }

    paths::init_cli_overrides(flags.data_dir.clone(), flags.config_dir.clone());
    app::run(flags)
}

/// Reads `--key value`, reporting a malformed value instead of aborting.
fn optional_value(args: &mut pico_args::Arguments, key: &'static str) -> Option<String> {
    match args.opt_value_from_str(key) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("Invalid value for {key}: {err}");
            None
        }
    }
}
