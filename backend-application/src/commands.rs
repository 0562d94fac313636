// Write-side use cases

pub mod ingest_commands;
