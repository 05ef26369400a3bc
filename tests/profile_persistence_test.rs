use anyhow::Result;
use birthday_profile::core::profile_store::{
    BIRTH_DATE_KEY, DEFAULT_IMAGE_FILE_NAME, IMAGE_FILE_NAME_KEY, NAME_KEY,
};
use birthday_profile::domain::ports::BlobStore;
use birthday_profile::{
    BirthdayConfig, JsonFileBackend, LocalBlobStore, PortraitFormat, PortraitImage, PortraitWriter,
    ProfileField, ProfileStore, StandardCodec,
};
use chrono::NaiveDate;
use std::sync::Arc;
use tempfile::TempDir;

fn gradient(width: u32, height: u32) -> PortraitImage {
    let mut pixels = Vec::new();
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[(x * 30) as u8, (y * 30) as u8, 128]);
        }
    }
    PortraitImage::from_rgb8(width, height, pixels).unwrap()
}

fn png_store(dir: &TempDir) -> Result<ProfileStore<JsonFileBackend, LocalBlobStore, StandardCodec>> {
    let backend = JsonFileBackend::open(dir.path().join("settings.json"))?;
    Ok(ProfileStore::new(
        backend,
        LocalBlobStore::new(dir.path()),
        StandardCodec::png(),
    ))
}

/// 重新開啟後所有欄位都應還原
#[test]
fn test_profile_survives_restart() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let date = NaiveDate::from_ymd_opt(2022, 1, 15).unwrap();
    let portrait = gradient(5, 7);

    {
        let store = png_store(&temp_dir)?;
        assert!(store.save(ProfileField::Name("Mia".to_string())).is_saved());
        assert!(store.save(ProfileField::BirthDate(date)).is_saved());
        assert!(store.save(ProfileField::Portrait(portrait.clone())).is_saved());
    }

    let profile = png_store(&temp_dir)?.load();
    assert_eq!(profile.name(), "Mia");
    assert_eq!(profile.birth_date(), Some(date));
    assert_eq!(profile.portrait_image(), Some(&portrait));
    assert!(profile.is_ready_for_birthday());

    assert!(temp_dir.path().join(DEFAULT_IMAGE_FILE_NAME).exists());
    Ok(())
}

#[test]
fn test_settings_file_uses_documented_keys() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = png_store(&temp_dir)?;
    store.save_name("Mia");
    store.save_birth_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    store.save_portrait(&gradient(2, 2));

    let raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(temp_dir.path().join("settings.json"))?)?;

    assert_eq!(raw[NAME_KEY]["value"], "Mia");
    assert_eq!(raw[BIRTH_DATE_KEY]["type"], "timestamp");
    assert_eq!(raw[IMAGE_FILE_NAME_KEY]["value"], DEFAULT_IMAGE_FILE_NAME);
    Ok(())
}

#[test]
fn test_no_image_ever_saved() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = png_store(&temp_dir)?;
    store.save_name("Mia");

    assert!(store.load().portrait_image().is_none());
    Ok(())
}

#[test]
fn test_deleted_blob_only_drops_portrait() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = png_store(&temp_dir)?;
    store.save_name("Mia");
    store.save_portrait(&gradient(3, 3));

    std::fs::remove_file(temp_dir.path().join(DEFAULT_IMAGE_FILE_NAME))?;

    let profile = store.load();
    assert_eq!(profile.name(), "Mia");
    assert!(profile.portrait_image().is_none());
    Ok(())
}

/// 預設設定下存入的頭像讀回時像素完全相同
#[test]
fn test_default_config_portrait_round_trip_is_exact() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut config = BirthdayConfig::default();
    config.storage.data_dir = temp_dir.path().to_string_lossy().into_owned();
    assert_eq!(config.image.format, PortraitFormat::Png);

    let portrait = gradient(16, 16);
    assert!(config.open_store()?.save_portrait(&portrait).is_saved());

    let blob = LocalBlobStore::new(temp_dir.path()).read_blob(DEFAULT_IMAGE_FILE_NAME)?;
    assert_eq!(&blob[..4], &[0x89, b'P', b'N', b'G']);

    let restored = config.open_store()?.load();
    assert_eq!(restored.portrait_image(), Some(&portrait));
    Ok(())
}

#[test]
fn test_jpeg_option_writes_jpeg_under_png_name() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = BirthdayConfig::from_toml_str(&format!(
        "[storage]\ndata_dir = {:?}\n\n[image]\nformat = \"jpeg\"\n",
        temp_dir.path().to_string_lossy()
    ))?;

    let store = config.open_store()?;
    assert!(store.save_portrait(&gradient(16, 16)).is_saved());

    let blob = LocalBlobStore::new(temp_dir.path()).read_blob(DEFAULT_IMAGE_FILE_NAME)?;
    assert_eq!(&blob[..2], &[0xFF, 0xD8]);

    let restored = store.load().portrait_image().cloned().unwrap();
    assert_eq!((restored.width(), restored.height()), (16, 16));
    Ok(())
}

#[tokio::test]
async fn test_background_writer_keeps_last_portrait() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(png_store(&temp_dir)?);
    let writer = PortraitWriter::spawn(Arc::clone(&store));

    let last = gradient(6, 6);
    writer.submit(gradient(2, 2))?;
    writer.submit(gradient(4, 4))?;
    writer.submit(last.clone())?;

    let stats = writer.shutdown().await?;
    assert_eq!(stats.saved, 3);
    assert_eq!(store.load().portrait_image(), Some(&last));
    Ok(())
}
