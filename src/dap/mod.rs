mod protocol;
mod server;

use crate::app::App;
use crate::buffers::BufferStore;
use crate::engine::Engine;
use crate::executor::Host;
use std::io::{self, BufRead, BufReader};
use std::sync::mpsc::{channel, Sender};
use std::thread;

pub use protocol::{read_message, write_message, DapMessage, DapMessageContent};
pub use server::DapServer;

/// Forward frames until the stream ends. Frames that do not decode are skipped.
fn forward_frames<R: BufRead>(reader: &mut R, tx: &Sender<DapMessage>) {
    loop {
        match read_message(reader) {
            Ok(Some(msg)) => {
                if tx.send(msg).is_err() {
                    break;
                }
            }
            Ok(None) => {
                log::info!("client closed the connection");
                break;
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                log::warn!("skipping unreadable DAP frame: {}", e);
            }
            Err(e) => {
                log::error!("DAP input failed: {}", e);
                break;
            }
        }
    }
}

fn spawn_frame_reader(tx: Sender<DapMessage>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(io::stdin());
        forward_frames(&mut reader, &tx);
    })
}

/// Serve the Debug Adapter Protocol on stdin/stdout until `disconnect`.
pub fn run_dap_mode<E: Engine, S: BufferStore>(app: App<E, S>) -> io::Result<()> {
    log::info!("DAP server starting");
    let (tx, rx) = channel();
    let _reader = spawn_frame_reader(tx);

    let mut server = DapServer::new(io::stdout());
    let mut host = Host::new(app);
    host.run(&mut server, &rx)?;
    log::info!("DAP server exiting");
    Ok(())
}
