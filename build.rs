//! Generates pseudo-random Zobrist keys at build time so that every build of
//! the engine gets its own constants (avoiding accidental reliance on
//! specific values) while keeping the keys as plain compiled-in arrays rather
//! than runtime-initialized state.

fn generate_file(filename: &str, contents: &str) {
    let out_dir = std::env::var_os("OUT_DIR").unwrap();
    let dest_path = std::path::Path::new(&out_dir).join(filename);
    std::fs::write(dest_path, contents).unwrap();
}

fn generate_zobrist_keys() {
    let mut rng = rand::thread_rng();
    for piece in [
        "white_king",
        "white_queen",
        "white_rook",
        "white_bishop",
        "white_knight",
        "white_pawn",
        "black_king",
        "black_queen",
        "black_rook",
        "black_bishop",
        "black_knight",
        "black_pawn",
    ] {
        let piece_keys: [u64; 64] = std::array::from_fn(|_| rand::Rng::gen(&mut rng));
        generate_file(
            &format!("{piece}_zobrist_keys"),
            &format!("{:?}", piece_keys),
        );
    }

    let en_passant_keys: [u64; 8] = std::array::from_fn(|_| rand::Rng::gen(&mut rng));
    generate_file("en_passant_zobrist_keys", &format!("{:?}", en_passant_keys));

    let castling_keys: [u64; 4] = std::array::from_fn(|_| rand::Rng::gen(&mut rng));
    generate_file("castling_zobrist_keys", &format!("{:?}", castling_keys));

    let side_to_move_key: u64 = rand::Rng::gen(&mut rng);
    generate_file("side_to_move_zobrist_key", &format!("{side_to_move_key}"));
}

fn main() {
    generate_zobrist_keys();
    println!("cargo:rerun-if-changed=build.rs");
}
