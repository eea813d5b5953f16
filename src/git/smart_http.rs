//! Git Smart HTTP transport over a `git` subprocess.
//!
//! Negotiation is left entirely to `git upload-pack` / `git receive-pack`
//! running in `--stateless-rpc` mode. This module only:
//! - frames the single `# service=...` packet-line the HTTP transport adds
//!   in front of a ref advertisement
//! - names the content types each response must carry
//! - pipes bytes between the request, the child and a response sink
//!
//! Each exchange spawns exactly one child. A `CancellationToken` bound to
//! the exchange kills the child when the caller goes away.

use std::path::Path;
use std::process::Stdio;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};

/// Flush packet: "no payload, section boundary".
pub const PKT_FLUSH: &[u8] = b"0000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    UploadPack,
    ReceivePack,
}

impl Service {
    /// Parse the `service` query value, e.g. `git-upload-pack`.
    pub fn from_query(value: &str) -> Result<Self> {
        match value {
            "git-upload-pack" => Ok(Service::UploadPack),
            "git-receive-pack" => Ok(Service::ReceivePack),
            other => Err(AppError::UnknownService(other.to_string())),
        }
    }

    /// Subcommand name as passed to `git`.
    pub fn name(self) -> &'static str {
        match self {
            Service::UploadPack => "upload-pack",
            Service::ReceivePack => "receive-pack",
        }
    }

    pub fn advertisement_content_type(self) -> String {
        format!("application/x-git-{}-advertisement", self.name())
    }

    pub fn result_content_type(self) -> String {
        format!("application/x-git-{}-result", self.name())
    }
}

/// Length-prefix `payload` as one packet-line. The four hex digits count
/// themselves.
pub fn encode_pkt_line(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 4);
    out.extend_from_slice(format!("{:04x}", payload.len() + 4).as_bytes());
    out.extend_from_slice(payload);
    out
}

/// `# service=git-<name>\n` as a packet-line, then a flush packet.
pub fn service_header(service: Service) -> Vec<u8> {
    let mut out = encode_pkt_line(format!("# service=git-{}\n", service.name()).as_bytes());
    out.extend_from_slice(PKT_FLUSH);
    out
}

/// A spawned `git <service> --stateless-rpc` child with all three pipes.
#[derive(Debug)]
pub struct GitProcess {
    service: Service,
    child: Child,
}

impl GitProcess {
    /// Spawn `<git> <service> --stateless-rpc [--advertise-refs] <repo_path>`.
    ///
    /// Fails with `AppError::Spawn` before anything has been written for
    /// the caller, so the failure can still become a status code.
    pub fn spawn(
        git: &str,
        service: Service,
        repo_path: &Path,
        advertise_refs: bool,
        git_protocol: Option<&str>,
    ) -> Result<Self> {
        let mut cmd = Command::new(git);
        cmd.arg(service.name()).arg("--stateless-rpc");
        if advertise_refs {
            cmd.arg("--advertise-refs");
        }
        cmd.arg(repo_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(protocol) = git_protocol {
            cmd.env("GIT_PROTOCOL", protocol);
        }

        tracing::debug!(
            "Spawning {} {} --stateless-rpc{} {}",
            git,
            service.name(),
            if advertise_refs { " --advertise-refs" } else { "" },
            repo_path.display()
        );

        let child = cmd.spawn().map_err(|source| AppError::Spawn {
            program: git.to_string(),
            service: service.name().to_string(),
            source,
        })?;

        Ok(Self { service, child })
    }

    pub fn service(&self) -> Service {
        self.service
    }

    /// Feed `input` to the child's stdin while copying its stdout into
    /// `output` as it is produced, then wait for it to exit.
    ///
    /// Returns the number of bytes copied. A non-zero exit becomes
    /// `AppError::ProcessExit` carrying the child's stderr; a cancelled
    /// token kills the child and returns `AppError::Cancelled`.
    pub async fn pipe<W>(mut self, input: Bytes, output: &mut W, cancel: CancellationToken) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let name = self.service.name();
        let missing = |pipe: &str| AppError::Internal(format!("git {} has no {}", name, pipe));
        let mut stdin = self.child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let mut stdout = self.child.stdout.take().ok_or_else(|| missing("stdout"))?;
        let mut stderr = self.child.stderr.take().ok_or_else(|| missing("stderr"))?;
        let mut stderr_buf = Vec::new();

        let feed = async move {
            match stdin.write_all(&input).await {
                // The child may exit without reading all of its input.
                Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(e),
                _ => {}
            }
            drop(stdin);
            Ok(())
        };

        let child = &mut self.child;
        let exchange = async {
            let (_, copied, _) = tokio::try_join!(
                feed,
                tokio::io::copy(&mut stdout, output),
                stderr.read_to_end(&mut stderr_buf),
            )?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((copied, status))
        };

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = exchange => Some(result),
        };

        let Some(result) = outcome else {
            let _ = self.child.kill().await;
            return Err(AppError::Cancelled(name.to_string()));
        };

        let (copied, status) = result?;
        if !status.success() {
            return Err(AppError::ProcessExit {
                service: name.to_string(),
                status,
                stderr: String::from_utf8_lossy(&stderr_buf).trim().to_string(),
            });
        }

        output.flush().await?;
        tracing::debug!("git {} streamed {} bytes", name, copied);
        Ok(copied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{git_available, TestRepo};

    #[test]
    fn test_service_header_framing() {
        let header = service_header(Service::UploadPack);
        let line = "# service=git-upload-pack\n";
        let prefix = format!("{:04x}", line.len() + 4);

        assert_eq!(prefix, "001e");
        assert_eq!(header, format!("{}{}0000", prefix, line).into_bytes());
        assert!(service_header(Service::ReceivePack).starts_with(b"001f# service=git-receive-pack\n"));
    }

    #[test]
    fn test_encode_pkt_line_counts_its_own_prefix() {
        assert_eq!(encode_pkt_line(b""), b"0004");
        assert_eq!(encode_pkt_line(b"a\n"), b"0006a\n");
        assert_eq!(&encode_pkt_line(&[b'x'; 0xfff0])[..4], b"fff4");
    }

    #[test]
    fn test_service_parsing_and_content_types() {
        let upload = Service::from_query("git-upload-pack").unwrap();
        assert_eq!(upload, Service::UploadPack);
        assert_eq!(upload.advertisement_content_type(), "application/x-git-upload-pack-advertisement");
        assert_eq!(upload.result_content_type(), "application/x-git-upload-pack-result");

        let receive = Service::from_query("git-receive-pack").unwrap();
        assert_eq!(receive.result_content_type(), "application/x-git-receive-pack-result");

        for bad in ["upload-pack", "git-upload-archive", ""] {
            assert!(matches!(Service::from_query(bad), Err(AppError::UnknownService(_))));
        }
    }

    #[test]
    fn test_spawn_failure_is_reported() {
        let fixture = TestRepo::new();
        let err = GitProcess::spawn(
            "/nonexistent/gitshelf-test-git",
            Service::UploadPack,
            fixture.path(),
            true,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_reported() {
        let fixture = TestRepo::new();
        // `false` ignores its arguments and exits 1.
        let process = GitProcess::spawn("false", Service::ReceivePack, fixture.path(), false, None).unwrap();

        let mut out = Vec::new();
        let err = process
            .pipe(Bytes::from_static(b"0000"), &mut out, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ProcessExit { ref service, .. } if service == "receive-pack"));
    }

    #[tokio::test]
    async fn test_cancelled_exchange_kills_the_child() {
        if !git_available() {
            return;
        }
        let fixture = TestRepo::new();
        fixture.commit("main", &[("a", "1\n")], "first");

        let process = GitProcess::spawn("git", Service::UploadPack, fixture.path(), false, None).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut out = Vec::new();
        let err = process.pipe(Bytes::new(), &mut out, cancel).await.unwrap_err();
        assert!(matches!(err, AppError::Cancelled(_)));
    }

    #[tokio::test]
    async fn test_advertise_refs_streams_git_output() {
        if !git_available() {
            return;
        }
        let fixture = TestRepo::new();
        let head = fixture.commit("main", &[("a", "1\n")], "first");

        let process = GitProcess::spawn("git", Service::UploadPack, fixture.path(), true, None).unwrap();
        let mut out = service_header(process.service());
        let copied = process.pipe(Bytes::new(), &mut out, CancellationToken::new()).await.unwrap();

        let text = String::from_utf8_lossy(&out);
        assert!(copied > 0);
        assert!(text.starts_with("001e# service=git-upload-pack\n0000"));
        assert!(text.contains("refs/heads/main"));
        assert!(text.contains(&head.to_string()));
        assert!(text.ends_with("0000"));
    }

    #[tokio::test]
    async fn test_empty_body_still_reaches_git() {
        if !git_available() {
            return;
        }
        let fixture = TestRepo::new();
        fixture.commit("main", &[("a", "1\n")], "first");

        let process = GitProcess::spawn("git", Service::UploadPack, fixture.path(), false, None).unwrap();
        let mut out = Vec::new();
        let result = process.pipe(Bytes::new(), &mut out, CancellationToken::new()).await;

        // Whatever git makes of an empty request, it is git's answer and
        // not a gateway failure.
        assert!(!matches!(result, Err(AppError::Spawn { .. }) | Err(AppError::Internal(_))));
    }
}
