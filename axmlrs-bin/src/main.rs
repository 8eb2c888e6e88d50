use anyhow::Result;
use axmlrs::{ApkDecoder, DecodeConfig, FrameworkStyles, Locale};
use clap::Parser;
use path_clean::PathClean;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(short, long = "file", value_parser)]
    file: Option<PathBuf>,

    #[clap(short, long = "dir", value_parser)]
    dir: Option<String>,

    /// Resolve references down to concrete values instead of @type/name.
    #[clap(long)]
    resolve_values: bool,

    /// Locale used to pick between per-configuration resources, e.g. en-US.
    #[clap(long)]
    locale: Option<String>,

    /// Leave enum/bitmask attribute values in their numeric form.
    #[clap(long)]
    no_humanize: bool,

    /// Framework style dictionary ("name = decimal-id" lines).
    #[clap(long, value_parser)]
    styles: Option<PathBuf>,

    /// Also print the well-known manifest fields.
    #[clap(long)]
    info: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    if let Some(dir_path) = &args.dir {
        let dir = std::fs::read_dir(dir_path)?;
        for entry in dir {
            let entry = entry?;
            let file_path = entry.path().clean();
            print_manifest(&file_path, &args)?;
        }
    } else if let Some(file_path) = &args.file {
        print_manifest(file_path, &args)?;
    } else {
        println!("No file or directory specified.");
    }

    Ok(())
}

fn print_manifest(file_path: &Path, args: &Args) -> Result<()> {
    let config = DecodeConfig {
        resolve_to_value: args.resolve_values,
        attribute_value_mapping: !args.no_humanize,
        locale: args
            .locale
            .as_deref()
            .map(Locale::new)
            .unwrap_or_else(Locale::host_default),
    };

    let mut decoder = ApkDecoder::from_file(file_path)?.with_config(config);
    if let Some(styles_path) = &args.styles {
        decoder = decoder.with_styles(FrameworkStyles::from_file(styles_path)?);
    }

    let document = decoder.decode()?;
    print!("{}", document);

    if args.info {
        print_info(&document)?;
    }

    Ok(())
}

/// Namespace-aware attribute lookup: decoded manifests carry the android
/// prefix on framework attributes, plain names otherwise.
fn get_attr(e: &BytesStart, name: &str) -> Result<Option<String>> {
    if let Some(attr) = e.try_get_attribute(format!("android:{}", name))? {
        return Ok(Some(attr.unescape_value()?.into_owned()));
    }
    if let Some(attr) = e.try_get_attribute(name)? {
        return Ok(Some(attr.unescape_value()?.into_owned()));
    }
    Ok(None)
}

fn print_info(document: &str) -> Result<()> {
    let mut xml_reader = quick_xml::reader::Reader::from_str(document);
    xml_reader.trim_text(true);

    let mut package = String::new();
    let mut version_code = String::new();
    let mut version_name = String::new();
    let mut min_sdk = String::new();
    let mut target_sdk = String::new();
    let mut label = String::new();
    let mut application_class = String::new();
    let mut icon = String::new();
    let mut permissions: Vec<String> = Vec::new();

    loop {
        match xml_reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name() {
                QName(b"manifest") => {
                    package = get_attr(&e, "package")?.unwrap_or_default();
                    version_code = get_attr(&e, "versionCode")?.unwrap_or_default();
                    version_name = get_attr(&e, "versionName")?.unwrap_or_default();
                }
                QName(b"uses-sdk") => {
                    min_sdk = get_attr(&e, "minSdkVersion")?.unwrap_or_default();
                    target_sdk = get_attr(&e, "targetSdkVersion")?.unwrap_or_default();
                }
                QName(b"application") => {
                    label = get_attr(&e, "label")?.unwrap_or_default();
                    application_class = get_attr(&e, "name")?.unwrap_or_default();
                    icon = get_attr(&e, "icon")?.unwrap_or_default();
                }
                QName(b"uses-permission") | QName(b"uses-permission-sdk-23") => {
                    if let Some(name) = get_attr(&e, "name")? {
                        permissions.push(name);
                    }
                }
                _ => {}
            },
            Ok(_) => {}
            Err(e) => {
                println!(
                    "Error at position {}: {:?}",
                    xml_reader.buffer_position(),
                    e
                );
                break;
            }
        }
    }

    println!("package: {:?}", package);
    println!("version_code: {:?}", version_code);
    println!("version_name: {:?}", version_name);
    println!("min_sdk: {:?}", min_sdk);
    println!("target_sdk: {:?}", target_sdk);
    println!("label: {:?}", label);
    println!("application_class: {:?}", application_class);
    println!("icon: {:?}", icon);
    println!("permissions");
    for permission in permissions {
        println!("{:?}", permission);
    }

    Ok(())
}
