//! User-facing texts.

use ceknomor_core::error::{ErrorCategory, VerifyError};
use ceknomor_core::model::{Outcome, Resolution, VerificationKind, VerificationResult};

/// Usage shown on `/start` and `/help`.
pub const USAGE: &str = "Bot aktif. Perintah yang tersedia:\n\n\
/ceknik <NIK> <KK> - periksa satu pasangan NIK dan KK\n\
/ceknik - kirim daftar NIK KK (satu pasangan per baris)\n\
/urlceknik <URL> - periksa NIK/KK dari spreadsheet\n\
/nomor <MSISDN...> - periksa status SIM\n\
/nomor - kirim daftar MSISDN (satu per baris)\n\
/urlcekstatus <URL> - periksa status SIM dari spreadsheet\n\
/batal - batalkan proses yang tertunda";

/// Wrong argument count for `/ceknik`.
pub const CEKNIK_USAGE: &str = "Format salah. Gunakan: /ceknik <NIK> <KK>";

/// Format prompt.
pub const CHOOSE_FORMAT: &str = "Data diterima. Pilih format output:";

/// Button payload that names no known format.
pub const UNKNOWN_FORMAT: &str = "Format tidak dikenali. Pilih format output:";

/// A newer batch replaced the pending one.
pub const BATCH_REPLACED: &str = "Data sebelumnya dibuang, data terbaru yang akan diproses.";

/// Shown right after a format is chosen.
pub const PROCESSING: &str = "Sedang memproses... Mohon tunggu.";

/// Shown after the report was delivered.
pub const DONE: &str = "Proses selesai. File telah dikirimkan.";

/// Plain text with nothing awaiting it.
pub const UNRECOGNIZED: &str =
    "Perintah tidak dikenali. Gunakan /nomor atau /ceknik untuk memulai, atau /help.";

/// `/batal` dropped something.
pub const CANCELLED: &str = "Proses dibatalkan.";

/// `/batal` with nothing to drop.
pub const NOTHING_TO_CANCEL: &str = "Tidak ada proses yang tertunda.";

/// Ask for a typed batch of `kind`.
#[must_use]
pub const fn ask_for_text(kind: VerificationKind) -> &'static str {
    match kind {
        VerificationKind::Identity => {
            "Silakan kirimkan NIK dan KK yang ingin diproses (satu pasangan per baris)."
        }
        VerificationKind::SimStatus => {
            "Silakan kirimkan MSISDN yang ingin diproses (pisahkan dengan enter)."
        }
    }
}

/// Text for an error caught at the conversation boundary.
#[must_use]
pub fn session_error(error: &VerifyError) -> String {
    match error.category() {
        ErrorCategory::UserInput | ErrorCategory::State => error.to_string(),
        _ => format!("Terjadi kesalahan: {error}"),
    }
}

/// Report could not be produced or sent; the batch is still pending.
#[must_use]
pub fn export_failed(error: &impl std::fmt::Display) -> String {
    format!("Gagal membuat atau mengirim file: {error}\nPilih format lain atau coba lagi:")
}

/// Reply for a single `/ceknik` lookup.
#[must_use]
pub fn identity_reply(result: &VerificationResult) -> String {
    match &result.outcome {
        Outcome::Success(Resolution::Identity(record)) => {
            let numbers = if record.numbers.is_empty() {
                "-".to_string()
            } else {
                record.numbers.join("\n")
            };
            format!(
                "NIK: {}\nNomor: {numbers}\nSisa: {}",
                record.label, record.remaining
            )
        }
        Outcome::Success(Resolution::SimStatus(_)) => "Gagal: unexpected response".to_string(),
        Outcome::Failure(error) => format!("Gagal: {error}"),
    }
}
