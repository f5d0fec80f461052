//! Chunked body streaming
//!
//! Writes a response body to disk in bounded reads, driving the per-chunk
//! progress callback. This is the sole mutation point for a transfer's
//! progress state.

use crate::error::FetchError;
use futures::TryStreamExt;
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tracing::debug;

/// Fixed read size for the download loop.
pub const CHUNK_SIZE: usize = 1_638_400;

/// Stream `response` into `dest_dir/filename`.
///
/// The destination directory is created recursively if missing. The body is
/// read into a [`CHUNK_SIZE`] buffer until a zero-length read signals end of
/// data; after each chunk is written, `on_chunk` receives the chunk length
/// and the running total. Returns the number of bytes written.
///
/// The file handle and the body stream are released on every exit path. The
/// first read or write error aborts the transfer; an incomplete file is left
/// on disk for the caller to inspect.
pub async fn stream_to_file<F>(
    response: reqwest::Response,
    dest_dir: &Path,
    filename: &str,
    mut on_chunk: F,
) -> Result<u64, FetchError>
where
    F: FnMut(u64, u64),
{
    fs::create_dir_all(dest_dir).await?;
    let path = dest_dir.join(filename);
    let mut file = File::create(&path).await?;

    let stream = response.bytes_stream().map_err(std::io::Error::other);
    let mut reader = StreamReader::new(stream);

    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut downloaded: u64 = 0;

    loop {
        let read = reader.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        file.write_all(&buffer[..read]).await?;
        downloaded += read as u64;
        on_chunk(read as u64, downloaded);
    }

    file.flush().await?;
    debug!("Wrote {} bytes to {}", downloaded, path.display());
    Ok(downloaded)
}
