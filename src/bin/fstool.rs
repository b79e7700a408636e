//! Reference command-line driver for `ecs150fs` images.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process;

use ecs150fs::{Error, FileSystem, FileVolume};

const USAGE: &str = "\
usage: fstool <command> <image> [args]

commands:
  format <blocks>   create <image> spanning <blocks> blocks and format it
  info              print filesystem information
  ls                list files
  create <name>     create an empty file
  rm <name>         delete a file
  stat <name>       print the size of a file
  add <path>        copy a host file into the image
  cat <name>        write a file's contents to stdout";

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(err) = run(&args) {
        eprintln!("fstool: {}", err);
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let (command, image, rest) = match args {
        [command, image, rest @ ..] => (command.as_str(), image.as_str(), rest),
        _ => return Err(USAGE.into()),
    };

    match (command, rest) {
        ("format", [blocks]) => {
            let volume = FileVolume::create(image, blocks.parse()?)?;
            unmount(FileSystem::format(volume)?)?;
            Ok(())
        }
        ("info", []) => with_image(image, |fs| {
            println!("{}", fs.info());
            Ok(())
        }),
        ("ls", []) => with_image(image, |fs| {
            println!("{}", fs.ls());
            Ok(())
        }),
        ("create", [name]) => with_image(image, |fs| fs.create(name)),
        ("rm", [name]) => with_image(image, |fs| fs.delete(name)),
        ("stat", [name]) => with_image(image, |fs| {
            let fd = fs.open(name)?;
            let size = fs.stat(fd)?;
            fs.close(fd)?;
            println!("size of '{}' is {} bytes", name, size);
            Ok(())
        }),
        ("add", [path]) => {
            let data = fs::read(path)?;
            let name = Path::new(path)
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or(Error::BadFilename)?
                .to_owned();
            with_image(image, move |fs| {
                fs.create(&name)?;
                let fd = fs.open(&name)?;
                let written = fs.write(fd, &data)?;
                fs.close(fd)?;
                if written < data.len() {
                    eprintln!(
                        "fstool: short write: {} of {} bytes",
                        written,
                        data.len()
                    );
                }
                Ok(())
            })
        }
        ("cat", [name]) => with_image(image, |fs| {
            let fd = fs.open(name)?;
            let size = fs.stat(fd)?;
            let mut data = vec![0u8; size as usize];
            fs.read(fd, &mut data)?;
            fs.close(fd)?;
            io::stdout().write_all(&data).map_err(Error::Io)
        }),
        _ => Err(USAGE.into()),
    }
}

fn with_image<F>(image: &str, operate: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(&mut FileSystem<FileVolume>) -> Result<(), Error>,
{
    let mut fs = FileSystem::mount(FileVolume::open(image)?)?;
    operate(&mut fs)?;
    unmount(fs)?;
    Ok(())
}

fn unmount(fs: FileSystem<FileVolume>) -> Result<(), Error> {
    fs.unmount().map(|_| ()).map_err(|(_, err)| err)
}
