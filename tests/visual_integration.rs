use linkcard::style::Rgba;
use linkcard::{
    CardGenerator, CardRequest, FontBook, MetadataResolver, PageInfo, QrCodeProvider, QrProvider,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tiny_skia::Pixmap;
use url::Url;

/// Counts calls and hands out fixed metadata.
struct CountingResolver {
    calls: Arc<AtomicUsize>,
}

impl MetadataResolver for CountingResolver {
    fn resolve(&self, _url: &Url) -> PageInfo {
        self.calls.fetch_add(1, Ordering::SeqCst);
        PageInfo::new("Resolved title", "Resolved description")
    }
}

/// Remembers what it was asked to encode.
#[derive(Default)]
struct RecordingQr {
    encoded: Mutex<Vec<String>>,
}

impl QrProvider for RecordingQr {
    fn encode(&self, url: &str, pixel_size: u32, dark: Rgba, light: Rgba) -> linkcard::Result<Pixmap> {
        self.encoded.lock().unwrap().push(url.to_string());
        QrCodeProvider.encode(url, pixel_size, dark, light)
    }
}

fn fonts() -> Option<FontBook> {
    let extra: Vec<std::path::PathBuf> = std::env::var_os("LINKCARD_TEST_FONT")
        .map(|p| vec![p.into()])
        .unwrap_or_default();
    match FontBook::load(&extra, true) {
        Ok(f) => Some(f),
        Err(e) => {
            println!("No usable font ({}); skipping.", e);
            None
        }
    }
}

fn generator() -> Option<(CardGenerator, Arc<AtomicUsize>)> {
    let fonts = fonts()?;
    let calls = Arc::new(AtomicUsize::new(0));
    let generator = CardGenerator::from_parts(
        Arc::new(fonts),
        Arc::new(QrCodeProvider),
        Box::new(CountingResolver {
            calls: calls.clone(),
        }),
    );
    Some((generator, calls))
}

struct Decoded {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Decoded {
    fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let i = ((y * self.width + x) * 4) as usize;
        (self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3])
    }
}

fn decode(png_data: &[u8]) -> Decoded {
    let decoder = png::Decoder::new(png_data);
    let mut reader = decoder.read_info().expect("decode");
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).expect("frame");
    assert_eq!(info.color_type, png::ColorType::Rgba);
    buf.truncate(info.buffer_size());
    Decoded {
        width: info.width,
        height: info.height,
        rgba: buf,
    }
}

#[test]
fn white_card_with_overrides_skips_metadata() {
    let Some((generator, calls)) = generator() else { return };

    let request = CardRequest::new("example.com", "white")
        .with_title("Hello")
        .with_description("World");
    let card = generator.generate(&request).expect("render");

    assert_eq!(calls.load(Ordering::SeqCst), 0, "resolver must not be called");
    assert_eq!(card.title, "Hello");
    assert_eq!(card.description, "World");
    assert_eq!(&card.png[0..8], b"\x89PNG\r\n\x1a\n");

    let img = decode(&card.png);
    assert_eq!((img.width, img.height), (1000, 240));
    assert_eq!((card.width, card.height), (1000, 240));

    // Rounded corner stays transparent
    assert_eq!(img.pixel(0, 0).3, 0);
    // Border along the top edge
    assert_eq!(img.pixel(500, 0), (229, 231, 235, 255));
    // Plain background in the left margin
    assert_eq!(img.pixel(20, 230), (255, 255, 255, 255));
    // QR finder pattern at the top-left of the QR block (398, 12) logical
    assert_eq!(img.pixel(797, 25), (0x1F, 0x29, 0x37, 255));

    // Title glyphs darken part of the title band
    let dark_title = (40..400)
        .flat_map(|x| (40..72).map(move |y| (x, y)))
        .any(|(x, y)| img.pixel(x, y).0 < 128);
    assert!(dark_title, "expected title pixels");
}

#[test]
fn wechat_card_uses_brand_colors() {
    let Some((generator, _)) = generator() else { return };

    let request = CardRequest::new("https://example.com/page", "wechat")
        .with_title("你好")
        .with_description("世界");
    let card = generator.generate(&request).expect("render");
    let img = decode(&card.png);

    assert_eq!(img.pixel(0, 0).3, 0);
    assert_eq!(img.pixel(20, 230), (7, 193, 96, 255));
    // No border: the top edge is background
    assert_eq!(img.pixel(500, 0), (7, 193, 96, 255));
    // Dark modules are white in this style
    assert_eq!(img.pixel(797, 25), (255, 255, 255, 255));
}

#[test]
fn missing_override_is_resolved_per_field() {
    let Some((generator, calls)) = generator() else { return };

    let card = generator
        .generate(&CardRequest::new("example.com", "white").with_title("Mine"))
        .expect("render");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(card.title, "Mine");
    assert_eq!(card.description, "Resolved description");

    let card = generator
        .generate(&CardRequest::new("example.com", "white"))
        .expect("render");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(card.title, "Resolved title");
}

#[test]
fn long_text_still_renders() {
    let Some((generator, _)) = generator() else { return };

    let request = CardRequest::new("example.com", "white")
        .with_title("一个非常非常非常非常非常非常非常非常非常长的标题，肯定放不下")
        .with_description("描述".repeat(70));
    let card = generator.generate(&request).expect("render");
    // The card keeps the full text even though the image shows less
    assert_eq!(card.description.chars().count(), 140);
    assert_eq!(decode(&card.png).width, 1000);
}

#[test]
fn unknown_style_never_renders() {
    let Some((generator, calls)) = generator() else { return };

    let err = generator
        .generate(&CardRequest::new("example.com", "neon").with_title("a").with_description("b"))
        .unwrap_err();
    assert!(matches!(err, linkcard::Error::UnknownStyle(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn qr_encodes_the_link_as_entered() {
    let Some(fonts) = fonts() else { return };
    let qr = Arc::new(RecordingQr::default());
    let generator = CardGenerator::from_parts(
        Arc::new(fonts),
        qr.clone(),
        Box::new(CountingResolver {
            calls: Arc::new(AtomicUsize::new(0)),
        }),
    );

    for url in ["example.com", "https://example.com/docs?page=2"] {
        generator
            .generate(&CardRequest::new(url, "white").with_title("T").with_description("D"))
            .expect("render");
    }
    assert_eq!(
        *qr.encoded.lock().unwrap(),
        vec!["https://example.com", "https://example.com/docs?page=2"]
    );
}
