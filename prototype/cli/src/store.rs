use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
    time::Instant,
};

use libra_format::ValveState;

/// Receives every frame the link worker puts on the wire.
pub trait FrameSink: Send {
    fn record(&mut self, port: &str, state: ValveState, ok: bool) -> io::Result<()>;
}

/// CSV log of transmitted frames: `elapsed_ms,port,state,ok`.
pub struct FrameStore<W: Write> {
    writer: W,
    started: Instant,
}

impl FrameStore<BufWriter<File>> {
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> FrameStore<W> {
    pub fn new(mut writer: W) -> io::Result<Self> {
        writeln!(writer, "elapsed_ms,port,state,ok")?;
        Ok(Self {
            writer,
            started: Instant::now(),
        })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> FrameSink for FrameStore<W> {
    fn record(&mut self, port: &str, state: ValveState, ok: bool) -> io::Result<()> {
        writeln!(
            self.writer,
            "{},{},{},{}",
            self.started.elapsed().as_millis(),
            port,
            state,
            ok as u8,
        )?;
        self.writer.flush()
    }
}
