use criterion::{Criterion, criterion_group, criterion_main};
use dynlayout::{ElementSpec, FieldSpec, Primitive, Schema, TypeDescriptor, decode_array};

fn gen_schema(field_count: usize) -> Schema {
    let mut fields = Vec::with_capacity(field_count * 2);

    for i in 0..field_count {
        let count_name = format!("n{}", i);
        fields.push(FieldSpec::fixed(count_name.clone(), Primitive::U8));
        fields.push(FieldSpec::resolved(format!("f{}", i), move |prefix, _| {
            Ok(TypeDescriptor::array(
                Primitive::U16_LE,
                prefix.get_u64(&count_name)? as usize,
            ))
        }));
    }

    Schema::new(fields)
}

fn gen_packet(field_count: usize, elements: u8) -> Vec<u8> {
    let mut data = Vec::new();

    // Deterministic but non-trivial pattern
    for i in 0..field_count {
        data.push(elements);
        for j in 0..elements as usize * 2 {
            data.push(((i + j) * 31 % 256) as u8);
        }
    }

    data
}

fn bench_schema_decode(c: &mut Criterion) {
    for &field_count in &[1usize, 10, 50] {
        let schema = gen_schema(field_count);
        let packet = gen_packet(field_count, 4);

        c.bench_function(&format!("decode_{}_resolved_fields", field_count), |b| {
            b.iter(|| {
                let _ = schema.decode(&packet).unwrap();
            })
        });
    }
}

fn bench_array_decode(c: &mut Criterion) {
    let element = ElementSpec::from(gen_schema(1).fields().to_vec());
    let packet = gen_packet(100, 4);

    c.bench_function("decode_array_100_records", |b| {
        b.iter(|| {
            let _ = decode_array(&packet, &element, 100, 1).unwrap();
        })
    });
}

criterion_group!(benches, bench_schema_decode, bench_array_decode);
criterion_main!(benches);
