// src/services/upload_service.rs
//! Imagens dos serviços guardadas em disco e servidas em `/uploads`.
use crate::error::{AppError, AppResult};
use chrono::Utc;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const PUBLIC_PREFIX: &str = "/uploads/";

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_file_bytes: usize,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, max_file_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_file_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Só aceita `image/*` dentro do limite de tamanho.
    pub fn check_image(&self, file_name: Option<&str>, content_type: Option<&str>, size: usize) -> AppResult<()> {
        let is_image = content_type
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false);
        if !is_image {
            tracing::warn!("Upload recusado ({:?}): tipo {:?}", file_name, content_type);
            return Err(AppError::BadRequest("Only image files are allowed!".to_string()));
        }
        if size > self.max_file_bytes {
            tracing::warn!("Upload recusado ({:?}): {} bytes", file_name, size);
            return Err(AppError::BadRequest(format!(
                "File too large (max {} bytes)",
                self.max_file_bytes
            )));
        }
        Ok(())
    }

    /// Grava a imagem como `<millis>-<aleatório><ext>` e devolve o caminho público.
    pub async fn save_image(
        &self,
        file_name: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> AppResult<String> {
        self.check_image(file_name, content_type, bytes.len())?;

        let stored = format!(
            "{}-{}{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().as_u128() % 1_000_000_000,
            extension_of(file_name)
        );
        tokio::fs::write(self.dir.join(&stored), bytes).await?;
        tracing::debug!("Imagem gravada: {} ({} bytes)", stored, bytes.len());
        Ok(format!("{PUBLIC_PREFIX}{stored}"))
    }

    /// Resolve `/uploads/<nome>` para o ficheiro em disco. Caminhos fora da pasta são ignorados.
    pub fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let name = public_path.strip_prefix(PUBLIC_PREFIX)?;
        let valid = !name.is_empty()
            && !name.contains(['/', '\\'])
            && name != "."
            && name != "..";
        valid.then(|| self.dir.join(name))
    }

    /// Apaga os ficheiros indicados; falhas ficam apenas no log.
    pub async fn remove_all(&self, public_paths: &[String]) {
        for public_path in public_paths {
            let Some(path) = self.resolve(public_path) else {
                tracing::warn!("Caminho de imagem ignorado: {}", public_path);
                continue;
            };
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::debug!("Imagem apagada: {}", path.display()),
                Err(e) => tracing::warn!("Falha ao apagar {}: {}", path.display(), e),
            }
        }
    }
}

fn extension_of(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path) -> UploadStore {
        UploadStore::new(dir, 16)
    }

    #[tokio::test]
    async fn saves_and_removes_image() {
        let tmp = tempfile::tempdir().unwrap();
        let uploads = store(tmp.path());

        let public = uploads
            .save_image(Some("Foto.PNG"), Some("image/png"), b"png-bytes")
            .await
            .unwrap();
        assert!(public.starts_with(PUBLIC_PREFIX));
        assert!(public.ends_with(".png"));

        let on_disk = uploads.resolve(&public).unwrap();
        assert!(on_disk.exists());

        uploads.remove_all(&[public.clone()]).await;
        assert!(!on_disk.exists());
        // Segunda remoção só regista o erro
        uploads.remove_all(&[public]).await;
    }

    #[tokio::test]
    async fn rejects_non_images_and_large_files() {
        let tmp = tempfile::tempdir().unwrap();
        let uploads = store(tmp.path());

        assert!(matches!(
            uploads.save_image(Some("a.pdf"), Some("application/pdf"), b"%PDF").await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            uploads.save_image(Some("a.png"), None, b"x").await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            uploads.save_image(Some("big.png"), Some("image/png"), &[0u8; 17]).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn resolve_refuses_traversal() {
        let uploads = store(Path::new("/srv/uploads"));
        assert_eq!(
            uploads.resolve("/uploads/1-2.png"),
            Some(PathBuf::from("/srv/uploads/1-2.png"))
        );
        assert_eq!(uploads.resolve("/uploads/../etc/passwd"), None);
        assert_eq!(uploads.resolve("/uploads/.."), None);
        assert_eq!(uploads.resolve("/outra/1-2.png"), None);
    }

    #[test]
    fn extension_is_sanitized() {
        assert_eq!(extension_of(Some("foto.JPG")), ".jpg");
        assert_eq!(extension_of(Some("sem_extensao")), "");
        assert_eq!(extension_of(Some("x.p$p")), "");
        assert_eq!(extension_of(None), "");
    }
}
