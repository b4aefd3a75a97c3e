//! Downloads source corpora that are published online.

use std::path::{Path, PathBuf};

use exegete_ingest::njps;
use exn::ResultExt;
use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use crate::error::{ErrorKind, Result};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Downloads every NJPS book from Sefaria into the layout the NJPS adapter
/// reads. Books already on disk are skipped. Returns the number downloaded.
#[instrument(skip_all, fields(root = %root.display()))]
pub async fn fetch_njps(root: &Path) -> Result<usize> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .or_raise(|| ErrorKind::Fetch("could not build HTTP client".to_string()))?;
    let mut fetched = 0;
    for (grouping, books) in njps::GROUPINGS {
        for book in *books {
            let destination = njps::source_path(root, grouping, book);
            if fs::try_exists(&destination).await.or_raise(|| ErrorKind::Io(destination.clone()))? {
                debug!(book, "already downloaded");
                continue;
            }
            download(&client, &njps::download_url(book), &destination).await?;
            fetched += 1;
        }
    }
    info!(fetched, "NJPS sources ready");
    Ok(fetched)
}

/// Streams `url` to a sibling `.part` file, then renames it into place so an
/// interrupted download never looks complete.
async fn download(client: &reqwest::Client, url: &str, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Io(parent.to_path_buf()))?;
    }
    let partial = partial_path(destination);
    let response = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .or_raise(|| ErrorKind::Fetch(url.to_string()))?;
    let mut file = fs::File::create(&partial).await.or_raise(|| ErrorKind::Io(partial.clone()))?;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.or_raise(|| ErrorKind::Fetch(url.to_string()))?;
        file.write_all(&chunk).await.or_raise(|| ErrorKind::Io(partial.clone()))?;
    }
    file.flush().await.or_raise(|| ErrorKind::Io(partial.clone()))?;
    drop(file);
    fs::rename(&partial, destination)
        .await
        .or_raise(|| ErrorKind::Io(destination.to_path_buf()))?;
    debug!(url, destination = %destination.display(), "downloaded");
    Ok(())
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    destination.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_path_keeps_book_name() {
        let destination = Path::new("/corpus/Prophets/I Samuel.json");
        assert_eq!(partial_path(destination), Path::new("/corpus/Prophets/I Samuel.json.part"));
    }

    #[tokio::test]
    async fn test_existing_books_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        for (grouping, books) in njps::GROUPINGS {
            for book in *books {
                let path = njps::source_path(dir.path(), grouping, book);
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                std::fs::write(path, "{}").unwrap();
            }
        }
        assert_eq!(fetch_njps(dir.path()).await.unwrap(), 0);
    }
}
