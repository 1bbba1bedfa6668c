use clap::{arg,crate_version,Command};
use huffpack::{standard_huff,HeaderFormat,STD_OPTIONS};
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

const RCH: &str = "unreachable was reached";

fn ok_to_overwrite(path_out: &str) -> bool {
    if let Ok(_f) = std::fs::File::open(path_out) {
        let mut ans = String::new();
        eprint!("{} exists, overwrite? (y/n) ",path_out);
        std::io::stdin().read_line(&mut ans).expect("could not read stdin");
        if ans.trim_end()=="y" || ans.trim_end()=="Y" {
            log::warn!("existing file will not be truncated");
            return true;
        }
        return false;
    }
    true
}

fn main() -> STDRESULT
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let long_help =
"Examples:
---------
Compress:      `huffpack compress -i book.txt -o book.huff --header tree`
Expand:        `huffpack expand -i book.huff -o book.txt`";

    let formats = ["counts","tree"];

    let mut main_cmd = Command::new("huffpack")
        .about("Compress and expand with classic Huffman coding")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(Command::new("compress")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .arg(arg!(--header <FORMAT> "how the decoder rebuilds the code tree").value_parser(formats)
            .default_value("counts"))
        .arg(arg!(-f --force "write the output even if it is larger than the input"))
        .about("compress a file"));

    main_cmd = main_cmd.subcommand(Command::new("expand")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .about("expand a file"));

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let format = cmd.get_one::<String>("header").expect(RCH);
        if !ok_to_overwrite(path_out) {
            eprintln!("abort operation");
            return Ok(());
        }
        let mut opt = STD_OPTIONS;
        opt.header = match format.as_str() {
            "tree" => HeaderFormat::Tree,
            _ => HeaderFormat::Counts
        };
        opt.force = cmd.get_flag("force");
        let mut in_file = std::fs::File::open(path_in)?;
        let mut out_file = std::fs::OpenOptions::new().write(true).truncate(false).create(true).open(path_out)?;
        match standard_huff::compress(&mut in_file,&mut out_file,&opt) {
            Ok(bits) => {
                out_file.set_len(opt.out_offset + (bits + 7)/8)?;
                eprintln!("compressed into {} bits",bits);
            },
            Err(e) => {
                if let Some(huffpack::Error::NoGain) = e.downcast_ref::<huffpack::Error>() {
                    out_file.set_len(opt.out_offset)?;
                    eprintln!("no size reduction, output not written (use --force to override)");
                    return Ok(());
                }
                return Err(e);
            }
        }
    }

    if let Some(cmd) = matches.subcommand_matches("expand") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        if !ok_to_overwrite(path_out) {
            eprintln!("abort operation");
            return Ok(());
        }
        let mut in_file = std::fs::File::open(path_in)?;
        let mut out_file = std::fs::OpenOptions::new().write(true).truncate(false).create(true).open(path_out)?;
        let symbols = standard_huff::expand(&mut in_file,&mut out_file,&STD_OPTIONS)?;
        out_file.set_len(STD_OPTIONS.out_offset + symbols)?;
        eprintln!("expanded {} symbols",symbols);
    }

    Ok(())
}
