//! Key capture: a detached reader thread that turns raw stdin bytes into
//! [`KeyEvent`]s and hands them to the controller over a bounded channel.

use std::io::{self, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender, bounded};
use tracing::debug;

/// Capacity of the key queue; a full queue blocks the reader.
pub const KEY_QUEUE_CAPACITY: usize = 10;

/// Bytes read per call, enough for one escape sequence.
const READ_CHUNK: usize = 6;

const ESC: u8 = 0x1B;
const DEL: u8 = 0x7F;

/// One normalized keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Char(char),
    Up,
    Down,
    Left,
    Right,
    Delete,
    /// F5.
    Refresh,
    /// A lone ESC.
    Quit,
    /// Anything unrecognized, including unknown escape sequences (as 0x1B).
    Byte(u8),
}

/// Longest escape prefix held back while waiting for the rest of it.
const MAX_PENDING: usize = 8;

/// Turns raw reads into key events, stitching escape sequences that were
/// split across two reads.
#[derive(Debug, Default)]
pub struct KeyDecoder {
    pending: Vec<u8>,
}

impl KeyDecoder {
    /// Decodes one read's worth of input, in order.
    ///
    /// A lone ESC is `Quit` only when it is the entire read. A trailing
    /// escape prefix (`ESC`, `ESC [`, `ESC [ 1 5`, ...) is held and prepended
    /// to the next read.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<KeyEvent> {
        if self.pending.is_empty() && matches!(bytes, [ESC]) {
            return vec![KeyEvent::Quit];
        }

        let buf = [std::mem::take(&mut self.pending).as_slice(), bytes].concat();
        let mut events = Vec::new();
        let mut rest = buf.as_slice();
        loop {
            if is_partial_escape(rest) {
                self.pending = rest.to_vec();
                break;
            }
            let Some((event, used)) = decode_one(rest) else {
                break;
            };
            events.push(event);
            rest = &rest[used..];
        }
        events
    }
}

/// Whether `bytes` is the start of an escape sequence with no final byte yet.
fn is_partial_escape(bytes: &[u8]) -> bool {
    if bytes.len() > MAX_PENDING {
        return false;
    }
    match bytes {
        [ESC] => true,
        [ESC, b'[', body @ ..] => body.iter().all(|b| (0x20..=0x3F).contains(b)),
        _ => false,
    }
}

fn decode_one(bytes: &[u8]) -> Option<(KeyEvent, usize)> {
    let decoded = match bytes {
        [] => return None,
        [ESC, b'[', b'A', ..] => (KeyEvent::Up, 3),
        [ESC, b'[', b'B', ..] => (KeyEvent::Down, 3),
        [ESC, b'[', b'C', ..] => (KeyEvent::Right, 3),
        [ESC, b'[', b'D', ..] => (KeyEvent::Left, 3),
        [ESC, b'[', b'1', b'5', b'~', ..] => (KeyEvent::Refresh, 5),
        [ESC, b'[', b'3', b'~', ..] => (KeyEvent::Delete, 4),
        [ESC, b'[', rest @ ..] => (KeyEvent::Byte(ESC), 2 + csi_len(rest)),
        [ESC, ..] => (KeyEvent::Byte(ESC), 1),
        [DEL, ..] => (KeyEvent::Delete, 1),
        [b, ..] if *b == b' ' || b.is_ascii_graphic() => (KeyEvent::Char(char::from(*b)), 1),
        [b, ..] => (KeyEvent::Byte(*b), 1),
    };
    Some(decoded)
}

/// Length of a CSI body up to and including its final byte.
fn csi_len(body: &[u8]) -> usize {
    body.iter()
        .position(|b| (0x40..=0x7E).contains(b))
        .map_or(body.len(), |i| i + 1)
}

/// Starts the capture thread over `input`.
///
/// The thread is never joined: it may sit in a blocking read when the
/// session ends, and must not hold up process exit. It stops on its own
/// once `running` is cleared and the next read returns, on end of input,
/// or when the receiver is dropped. Dropping the sender disconnects the
/// returned channel.
pub fn spawn_reader<R>(input: R, running: Arc<AtomicBool>) -> io::Result<Receiver<KeyEvent>>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = bounded(KEY_QUEUE_CAPACITY);
    thread::Builder::new()
        .name("key-capture".into())
        .spawn(move || capture(input, &tx, &running))?;
    Ok(rx)
}

fn capture<R: Read>(mut input: R, tx: &Sender<KeyEvent>, running: &AtomicBool) {
    let mut buf = [0u8; READ_CHUNK];
    let mut decoder = KeyDecoder::default();
    while running.load(Ordering::Relaxed) {
        let n = match input.read(&mut buf) {
            Ok(0) => {
                debug!("stdin closed");
                return;
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!(error = %e, "stdin read failed");
                return;
            }
        };

        for event in decoder.feed(&buf[..n]) {
            if tx.send(event).is_err() {
                return;
            }
        }
    }
}

/// Standard input read straight from its descriptor, so each read returns
/// what the terminal delivered rather than a slice of a userspace buffer.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawStdin;

impl Read for RawStdin {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe { libc::read(libc::STDIN_FILENO, buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }
}
