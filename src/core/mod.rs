// ─── Launcher Updater Core ───
// Self-update engine for the launcher and its tracked add-on.
//
// Architecture:
//   core/
//     manifest/   — Channel manifest + release tag parsing
//     integrity   — SHA-1 / size checks against manifest records
//     downloader/ — Concurrent downloads with a bounded worker pool
//     updater/    — Host pass: reconcile, resolve, self-update, download
//     addon/      — Add-on version record, tracker, archive deploy
//     launch/     — Relaunching the replaced binary
//     http        — Blocking HTTP transport
//     state/      — Settings and per-run application state

pub mod addon;
pub mod downloader;
pub mod error;
pub mod http;
pub mod integrity;
pub mod launch;
pub mod manifest;
pub mod state;
pub mod updater;

#[cfg(test)]
pub(crate) mod test_support;
