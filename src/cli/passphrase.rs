//! Passphrase CLI commands
//!
//! Stores and checks the passphrase verifier kept in settings. Also hosts the
//! prompt helpers shared by the export, import and backup commands.

use clap::Subcommand;

use crate::config::{Settings, VaultPaths};
use crate::crypto::{hash_passphrase, verify_passphrase, Passphrase};
use crate::error::{VaultError, VaultResult};

/// Environment variable that supplies the passphrase non-interactively
pub const PASSPHRASE_ENV: &str = "FINVAULT_PASSPHRASE";

/// Shortest passphrase accepted by `passphrase set`
pub const MIN_PASSPHRASE_LEN: usize = 8;

/// Passphrase subcommands
#[derive(Subcommand)]
pub enum PassphraseCommands {
    /// Store a verifier for a new passphrase
    Set,

    /// Check a passphrase against the stored verifier
    Verify,
}

/// Handle a passphrase command
pub fn handle_passphrase_command(
    paths: &VaultPaths,
    settings: &mut Settings,
    cmd: PassphraseCommands,
) -> VaultResult<()> {
    match cmd {
        PassphraseCommands::Set => set_passphrase(paths, settings),
        PassphraseCommands::Verify => check_passphrase(settings),
    }
}

fn set_passphrase(paths: &VaultPaths, settings: &mut Settings) -> VaultResult<()> {
    if let Some(verifier) = &settings.passphrase_verifier {
        let current = read_passphrase("Enter current passphrase: ")?;
        if !verify_passphrase(&current, verifier) {
            println!("Passphrase is incorrect.");
            return Err(VaultError::Decryption);
        }
    }

    let passphrase = read_new_passphrase()?;
    println!("Deriving key...");
    settings.passphrase_verifier = Some(hash_passphrase(&passphrase)?);
    settings.save(paths)?;

    println!("Passphrase saved.");
    println!("Remember to keep it safe - encrypted exports cannot be recovered without it.");
    Ok(())
}

fn check_passphrase(settings: &Settings) -> VaultResult<()> {
    let Some(verifier) = &settings.passphrase_verifier else {
        println!("No passphrase has been set.");
        println!("Run 'finvault passphrase set' first.");
        return Err(VaultError::Config("no passphrase set".into()));
    };

    let passphrase = read_passphrase("Enter passphrase: ")?;
    if verify_passphrase(&passphrase, verifier) {
        println!("Passphrase is correct!");
        Ok(())
    } else {
        println!("Passphrase is incorrect.");
        Err(VaultError::Decryption)
    }
}

/// Passphrase from `FINVAULT_PASSPHRASE`, or a hidden prompt
pub fn read_passphrase(prompt: &str) -> VaultResult<Passphrase> {
    if let Ok(value) = std::env::var(PASSPHRASE_ENV) {
        return Ok(Passphrase::new(value));
    }
    rpassword::prompt_password(prompt)
        .map(Passphrase::new)
        .map_err(|e| VaultError::Io(format!("Failed to read passphrase: {}", e)))
}

/// New passphrase, confirmed when typed interactively
pub fn read_new_passphrase() -> VaultResult<Passphrase> {
    if let Ok(value) = std::env::var(PASSPHRASE_ENV) {
        let passphrase = Passphrase::new(value);
        check_length(&passphrase)?;
        return Ok(passphrase);
    }

    loop {
        let first = read_passphrase("Enter new passphrase: ")?;
        if check_length(&first).is_err() {
            println!(
                "Passphrase must be at least {} characters. Please try again.",
                MIN_PASSPHRASE_LEN
            );
            continue;
        }

        let second = read_passphrase("Confirm passphrase: ")?;
        if first != second {
            println!("Passphrases do not match. Please try again.");
            continue;
        }

        return Ok(first);
    }
}

fn check_length(passphrase: &Passphrase) -> VaultResult<()> {
    if passphrase.as_str().chars().count() < MIN_PASSPHRASE_LEN {
        return Err(VaultError::Validation(format!(
            "passphrase must be at least {} characters",
            MIN_PASSPHRASE_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_length() {
        assert!(check_length(&Passphrase::new("short")).is_err());
        assert!(check_length(&Passphrase::new("long enough")).is_ok());
        // Counted in characters, not bytes
        assert!(check_length(&Passphrase::new("ééééééé")).is_err());
    }
}
