use anyhow::Result;
use oorandom::Rand64;
use std::io::Cursor;

use uniqip::ChunkReader;

fn lines_with_block(input: &[u8], block: usize) -> Result<Vec<Vec<u8>>> {
    let mut out = Vec::new();
    for chunk in ChunkReader::new(Cursor::new(input), block)? {
        let chunk = chunk?;
        out.extend(chunk.lines().map(|l| l.to_vec()));
    }
    Ok(out)
}

fn random_log(rng: &mut Rand64, lines: usize) -> Vec<u8> {
    let mut s = String::new();
    for i in 0..lines {
        match rng.rand_range(0..10) {
            0 => {}                                   // пустая строка
            1 => s.push_str(&"z".repeat(300)),        // длиннее мелких блоков
            _ => s.push_str(&format!(
                "{}.{}.{}.{}",
                rng.rand_range(0..256),
                rng.rand_range(0..256),
                rng.rand_range(0..256),
                rng.rand_range(0..256)
            )),
        }
        // Последняя строка иногда без '\n'.
        if i + 1 < lines || rng.rand_range(0..2) == 0 {
            s.push('\n');
        }
    }
    s.into_bytes()
}

/// Набор строк не зависит от размера физического блока.
#[test]
fn lines_identical_for_every_block_size() -> Result<()> {
    let mut rng = Rand64::new(0xC0FFEE);
    for round in 0..8 {
        let input = random_log(&mut rng, 200);
        let reference = lines_with_block(&input, input.len().max(1) + 1)?;
        for block in [1usize, 2, 3, 5, 16, 64, 257, 4096] {
            let got = lines_with_block(&input, block)?;
            assert_eq!(got, reference, "round={} block={}", round, block);
        }
    }
    Ok(())
}

#[test]
fn spec_example_split_into_single_bytes() -> Result<()> {
    let tiny = lines_with_block(b"a\nb\nc\n", 1)?;
    let whole = lines_with_block(b"a\nb\nc\n", 6)?;
    assert_eq!(tiny, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    assert_eq!(tiny, whole);
    Ok(())
}

#[test]
fn final_line_without_terminator_is_delivered() -> Result<()> {
    let lines = lines_with_block(b"1.1.1.1\n2.2.2.2", 4)?;
    assert_eq!(lines, vec![b"1.1.1.1".to_vec(), b"2.2.2.2".to_vec()]);
    Ok(())
}
