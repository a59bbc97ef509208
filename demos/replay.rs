//! Replay demo: Feed a scripted terminal session through the narrator.
//!
//! Prints every utterance as it would be spoken. Run with
//! `RUST_LOG=debug` to see the narrator's internal decisions.

use narrator::{Bounds, ChannelSink, ConfigHandle, HostEvent, MonitorMode, Narrator, VtBuffer};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const SESSION: &[(&[u8], u64)] = &[
    (b"\x1b[1m$\x1b[0m cargo build\r\n", 300),
    (b"   Compiling narrator v0.1.0\r\n", 50),
    (b"   Compiling demo v0.1.0\r\n", 400),
    (b"Downloading [##        ] 20%", 100),
    (b"\rDownloading [#####     ] 50%", 100),
    (b"\rDownloading [##########] 100%\r\n", 400),
    (b"\x1b[32m    Finished\x1b[0m dev profile\r\n$ ", 600),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let screen = Arc::new(VtBuffer::new(24, 80));
    let (sink, speech) = ChannelSink::new(64);
    let narrator = Narrator::new(Arc::clone(&screen), ConfigHandle::default(), Arc::new(sink))?;

    narrator
        .regions()
        .add("status line", Bounds::new(24, 1, 24, 80), None, MonitorMode::Changes)?;
    narrator.regions().start()?;

    let speaker = thread::spawn(move || {
        for utterance in speech {
            println!("[{:?}] {}", utterance.origin, utterance.text);
        }
    });

    narrator.handle_event(HostEvent::ContentChanged);
    for (bytes, pause_ms) in SESSION {
        screen.process(bytes);
        narrator.handle_event(HostEvent::ContentChanged);
        narrator.handle_event(HostEvent::CaretMoved);
        thread::sleep(Duration::from_millis(*pause_ms));
    }

    screen.process(b"\x1b[24;1Hready");
    thread::sleep(Duration::from_millis(700));
    println!("cursor at {}", narrator.describe_position());

    drop(narrator);
    let _ = speaker.join();
    Ok(())
}
