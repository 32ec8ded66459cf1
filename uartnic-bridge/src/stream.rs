//! Serial stream abstraction for tty devices and serial-over-TCP bridges.

use crate::config::SerialEndpoint;
use pin_project_lite::pin_project;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;

pin_project! {
    /// A serial byte stream, either a device file or a TCP connection.
    #[project = SerialStreamProj]
    pub enum SerialStream {
        Tcp { #[pin] stream: TcpStream },
        // Separate handles so a pending read never holds up a write.
        Device { #[pin] reader: File, #[pin] writer: File },
    }
}

impl SerialStream {
    pub async fn open(endpoint: &SerialEndpoint) -> io::Result<Self> {
        match endpoint {
            SerialEndpoint::Tcp(addr) => {
                let stream = TcpStream::connect(addr.as_str()).await?;
                stream.set_nodelay(true)?;
                tracing::debug!(%addr, "connected to serial bridge");
                Ok(SerialStream::Tcp { stream })
            }
            SerialEndpoint::Device(path) => {
                let reader = OpenOptions::new().read(true).open(path).await?;
                let writer = OpenOptions::new().write(true).open(path).await?;
                tracing::debug!(path = %path.display(), "opened serial device");
                Ok(SerialStream::Device { reader, writer })
            }
        }
    }

    pub fn is_tcp(&self) -> bool {
        matches!(self, SerialStream::Tcp { .. })
    }
}

impl AsyncRead for SerialStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.project() {
            SerialStreamProj::Tcp { stream } => stream.poll_read(cx, buf),
            SerialStreamProj::Device { reader, .. } => reader.poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for SerialStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.project() {
            SerialStreamProj::Tcp { stream } => stream.poll_write(cx, buf),
            SerialStreamProj::Device { writer, .. } => writer.poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.project() {
            SerialStreamProj::Tcp { stream } => stream.poll_flush(cx),
            SerialStreamProj::Device { writer, .. } => writer.poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.project() {
            SerialStreamProj::Tcp { stream } => stream.poll_shutdown(cx),
            SerialStreamProj::Device { writer, .. } => writer.poll_shutdown(cx),
        }
    }
}
