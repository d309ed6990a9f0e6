/*!

This is the long-form manual for `sitzverteilung` and `sitzrechner`.

## Input files

An election is a directory with four JSON files. The order of the keys in
every object is significant: it is the order in which ties are broken.

### `Länder.json`

The states and their seat entitlement weight, usually the population:

```json
{ "Nord": 5200000, "Süd": 3100000.5 }
```

### `Zweitstimmen.json`

The second votes of every party in every state:

```json
{ "Blau": { "Nord": 120000, "Süd": 80000 }, "Rot": { "Nord": 90000 } }
```

A missing state counts as zero votes.

### `Erststimmen.json`

The first votes of every party in every constituency, grouped by state:

```json
{ "Nord": { "Hafen": { "Blau": 410, "Rot": 390 } } }
```

The party with the most first votes wins the constituency. Equal maxima go
to the party listed first. A constituency where nobody got a vote has no
winner. Winners that did not get second votes, or whose party is not
admitted, keep their seat as independents.

### `Einstellungen.json`

| Key | Values | Default |
|-----|--------|---------|
| `Sitze` | planned number of seats | required |
| `Hürde` | `{ "Prozent": 5, "Direkt": 3, "Ausnahmen": ["SSW"] }` | no threshold |
| `Mindestsitze` | `Keine`, `Pur`, `Mittelwert` | `Keine` |
| `Mittelwertrundung` | `abrunden`, `aufrunden` | `abrunden` |
| `Überhang` | tolerated overhang mandates | 0 |
| `Obergrenze` | maximum size of the parliament | unbounded |
| `Verfahren` | `divisor`, `rangzahl`, `debug` | `divisor` |

A party is admitted if it reaches the percentage, or wins at least `Direkt`
constituencies, or is listed in `Ausnahmen`. Without `Prozent` and `Direkt`
every party is admitted.

## Minimum seats

For every admitted party and state, the minimum seats compare the direct
mandates with the list seats of a first distribution within the state:
* `Keine`: the direct mandates
* `Pur`: the larger of the two
* `Mittelwert`: the larger of the direct mandates and the mean of both,
  rounded down (`abrunden`) or up (`aufrunden`)

The national distribution grows until every party reaches its minimum, except
for `Überhang` seats. With `Obergrenze`, the growth stops early and the
remaining overhang is kept uncompensated.

## Lotteries

When seats cannot be assigned without drawing lots, the tied entities are
listed and the user chooses one at a time, or `0` to draw the remaining
seats at random. The random draw is reproducible for a given `--seed`.
`--lottery random` draws without asking, `--draws 2,1` answers in advance.

## Output

A JSON summary with the configuration, the seats per party, the seats per
state, the admission decisions and a protocol of every divisor and lottery.
With `--reference`, the results are compared with a previous summary.
*/
