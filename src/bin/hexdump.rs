use std::process::ExitCode;

fn main() -> ExitCode {
    let path = match std::env::args().nth(1) {
        Some(p) => p,
        None => {
            eprintln!("usage: hexdump <document file>");
            return ExitCode::FAILURE;
        }
    };
    let data = match std::fs::read(&path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("{path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    match (glintx::flags(&data), glintx::schema_hash(&data)) {
        (Ok(flags), Ok(hash)) => {
            println!("flags {flags:#04x}  schema hash {hash}  {} bytes", data.len());
        }
        _ => println!("(no document header)  {} bytes", data.len()),
    }

    for (i, chunk) in data.chunks(16).enumerate() {
        print!("{:04x}: ", i * 16);
        for b in chunk {
            print!("{b:02x} ");
        }
        for _ in chunk.len()..16 {
            print!("   ");
        }
        print!(" | ");
        for b in chunk {
            if (32..127).contains(b) {
                print!("{}", *b as char);
            } else {
                print!(".");
            }
        }
        println!();
    }
    ExitCode::SUCCESS
}
